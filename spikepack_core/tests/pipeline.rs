use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use spikepack_core::{
    CompressJob, Compressor, Error, Outcome, Pipeline, RecordingParams, SampleDtype, SkipReason,
};

/// Fake backend that records each job and writes marker outputs.
#[derive(Clone, Default)]
struct FakeCompressor {
    calls: Rc<RefCell<Vec<(PathBuf, RecordingParams)>>>,
    fail: bool,
}

impl Compressor for FakeCompressor {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn compress(&self, job: &CompressJob<'_>) -> anyhow::Result<()> {
        self.calls
            .borrow_mut()
            .push((job.source.to_path_buf(), *job.params));
        if self.fail {
            anyhow::bail!("disk full");
        }
        fs::write(job.cbin, b"payload")?;
        fs::write(job.ch, b"{}")?;
        Ok(())
    }
}

fn write(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn pipeline() -> (Pipeline, FakeCompressor) {
    let fake = FakeCompressor::default();
    (Pipeline::new(Box::new(fake.clone())), fake)
}

#[test]
fn compresses_then_removes_source() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("rec.ap.bin");
    write(&bin, &[0u8; 8]);
    write(&dir.path().join("rec.ap.meta"), b"nSavedChans=2\nimSampRate=30000\n");

    let (pipeline, fake) = pipeline();
    let outcome = pipeline.process(&bin).unwrap();

    assert_eq!(outcome, Outcome::Compressed { bytes: 8 });
    assert!(!bin.exists());
    assert!(dir.path().join("rec.ap.cbin").exists());
    assert!(dir.path().join("rec.ap.ch").exists());

    let calls = fake.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1,
        RecordingParams {
            n_channels: 2,
            sample_rate: 30000.0,
            dtype: SampleDtype::Int16
        }
    );
}

#[test]
fn missing_sidecar_leaves_recording_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("lonely.nidq.bin");
    write(&bin, b"raw");

    let (pipeline, fake) = pipeline();
    assert_eq!(
        pipeline.process(&bin).unwrap(),
        Outcome::Skipped(SkipReason::MetaMissing)
    );
    assert!(bin.exists());
    assert!(!dir.path().join("lonely.nidq.cbin").exists());
    assert!(fake.calls.borrow().is_empty());
}

#[test]
fn corrupt_sidecar_leaves_recording_untouched() {
    for sidecar in [&b"nSavedChans=2\nthis line has no separator\n"[..], &b"nSavedChans=\xff\xfe\n"[..]] {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("rec.ap.bin");
        write(&bin, b"raw");
        write(&dir.path().join("rec.ap.meta"), sidecar);

        let (pipeline, fake) = pipeline();
        assert_eq!(
            pipeline.process(&bin).unwrap(),
            Outcome::Skipped(SkipReason::MetaCorrupt)
        );
        assert!(bin.exists());
        assert!(fake.calls.borrow().is_empty());
    }
}

#[test]
fn existing_payload_is_never_recompressed() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("rec.ap.bin");
    write(&bin, b"raw");
    write(&dir.path().join("rec.ap.meta"), b"nSavedChans=2\nimSampRate=30000\n");
    write(&dir.path().join("rec.ap.cbin"), b"older payload");

    let (pipeline, fake) = pipeline();
    assert_eq!(
        pipeline.process(&bin).unwrap(),
        Outcome::Skipped(SkipReason::AlreadyCompressed)
    );
    assert!(bin.exists());
    assert_eq!(fs::read(dir.path().join("rec.ap.cbin")).unwrap(), b"older payload");
    assert!(fake.calls.borrow().is_empty());
}

#[test]
fn compressor_failure_keeps_source() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("rec.ap.bin");
    write(&bin, b"raw");
    write(&dir.path().join("rec.ap.meta"), b"nSavedChans=2\nimSampRate=30000\n");

    let fake = FakeCompressor {
        fail: true,
        ..Default::default()
    };
    let pipeline = Pipeline::new(Box::new(fake));
    let err = pipeline.process(&bin).unwrap_err();

    assert!(matches!(err, Error::Compressor { compressor: "fake", .. }), "got {err:?}");
    assert!(err.to_string().contains("disk full"));
    assert!(bin.exists());
}

#[test]
fn missing_channel_count_fails_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("rec.ap.bin");
    write(&bin, b"raw");
    write(&dir.path().join("rec.ap.meta"), b"imSampRate=30000\n");

    let (pipeline, fake) = pipeline();
    assert!(matches!(
        pipeline.process(&bin),
        Err(Error::MissingKey("nSavedChans"))
    ));
    assert!(bin.exists());
    assert!(fake.calls.borrow().is_empty());
}

#[test]
fn run_counts_outcomes_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("s1/a.imec0.ap.bin"), &[0u8; 4]);
    write(&root.join("s1/a.imec0.ap.meta"), b"nSavedChans=2\nimSampRate=29999.9\n");
    write(&root.join("s2/b.nidq.bin"), &[0u8; 6]);
    write(&root.join("s2/b.nidq.meta"), b"nSavedChans=3\nniSampRate=25000\n");
    write(&root.join("s3/orphan.bin"), b"raw");
    write(&root.join("s4/bad.bin"), b"raw");
    write(&root.join("s4/bad.meta"), b"nSavedChans=oops\nniSampRate=25000\n");
    write(&root.join("s1/.phy/ignored.bin"), b"raw");

    let (pipeline, fake) = pipeline();
    let stats = pipeline.run(root).unwrap();
    assert_eq!(stats.visited, 4);
    assert_eq!(stats.compressed, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.bytes_in, 10);
    assert!(root.join("s1/.phy/ignored.bin").exists());
    assert!(root.join("s4/bad.bin").exists());

    let again = pipeline.run(root).unwrap();
    assert_eq!(again.visited, 2);
    assert_eq!(again.compressed, 0);
    assert_eq!(again.skipped, 1);
    assert_eq!(again.failed, 1);
    assert_eq!(fake.calls.borrow().len(), 2);
}

#[test]
fn run_rejects_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline();
    assert!(matches!(
        pipeline.run(&dir.path().join("nope")),
        Err(Error::NotADirectory(_))
    ));
}

#[cfg(unix)]
#[test]
fn unreadable_directory_counts_as_failure() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let locked = root.join("locked");
    write(&locked.join("a.bin"), b"raw");
    write(&root.join("b.bin"), b"raw");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let (pipeline, _) = pipeline();
    let stats = pipeline.run(root);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let stats = stats.unwrap();
    assert_eq!(stats.visited, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 1);
}
