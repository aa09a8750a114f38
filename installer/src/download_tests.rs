//! Unit tests for bounded package downloads.

use super::*;
use crate::test_utils::sha256_hex;
use rstest::{fixture, rstest};
use std::io::Write;
use tempfile::TempDir;

const URL: &str = "https://ftp.example.test/pub/softpaq/sp12345.exe";
const BODY: &[u8] = b"MZ softpaq payload";

struct Cache {
    temp: TempDir,
    destination: Utf8PathBuf,
}

impl Cache {
    fn entries(&self) -> usize {
        std::fs::read_dir(self.temp.path()).expect("read cache").count()
    }
}

#[fixture]
fn cache() -> Cache {
    let temp = tempfile::tempdir().expect("temp dir");
    let destination =
        Utf8PathBuf::try_from(temp.path().join("sp12345.exe")).expect("UTF-8 path");
    Cache { temp, destination }
}

fn digest_of(bytes: &[u8]) -> Sha256Digest {
    Sha256Digest::try_from(sha256_hex(bytes).as_str()).expect("valid digest")
}

fn write_body(file: &mut File) -> Result<u64, HttpError> {
    file.write_all(BODY)?;
    Ok(BODY.len() as u64)
}

fn transfer_failure(url: &str) -> HttpError {
    HttpError::Transfer {
        url: url.to_owned(),
        reason: "connection reset".to_owned(),
    }
}

#[rstest]
fn first_attempt_success_is_verified(cache: Cache) {
    let mut transport = MockPackageTransport::new();
    transport
        .expect_download()
        .times(1)
        .returning(|_, file| write_body(file));

    let expected = digest_of(BODY);
    let report = Downloader::new(&transport)
        .fetch(URL, &cache.destination, Some(&expected))
        .expect("fetched");

    assert_eq!(report.attempts, 1);
    assert!(!report.reused);
    assert_eq!(report.checksum, ChecksumStatus::Verified);
    assert_eq!(std::fs::read(&cache.destination).expect("read"), BODY);
}

#[rstest]
fn retries_until_a_transfer_completes(cache: Cache) {
    let mut calls = 0;
    let mut transport = MockPackageTransport::new();
    transport
        .expect_download()
        .times(3)
        .returning(move |url, file| {
            calls += 1;
            if calls < 3 {
                Err(transfer_failure(url))
            } else {
                write_body(file)
            }
        });

    let report = Downloader::new(&transport)
        .fetch(URL, &cache.destination, None)
        .expect("fetched");

    assert_eq!(report.attempts, 3);
    assert_eq!(report.checksum, ChecksumStatus::Unverified);
}

#[rstest]
fn gives_up_after_five_attempts(cache: Cache) {
    let mut transport = MockPackageTransport::new();
    transport
        .expect_download()
        .times(5)
        .returning(|url, _| Err(transfer_failure(url)));

    let err = Downloader::new(&transport)
        .fetch(URL, &cache.destination, None)
        .expect_err("exhausted");

    assert!(matches!(err, DownloadError::Exhausted { attempts: 5, .. }));
    assert!(!cache.destination.exists());
    assert_eq!(cache.entries(), 0, "no partial files left behind");
}

#[rstest]
fn interrupted_transfer_is_discarded_not_resumed(cache: Cache) {
    let mut calls = 0;
    let mut transport = MockPackageTransport::new();
    transport.expect_download().times(2).returning(move |url, file| {
        calls += 1;
        if calls == 1 {
            file.write_all(b"MZ trunc")?;
            Err(transfer_failure(url))
        } else {
            write_body(file)
        }
    });

    let report = Downloader::new(&transport)
        .fetch(URL, &cache.destination, Some(&digest_of(BODY)))
        .expect("fetched");

    assert_eq!(report.checksum, ChecksumStatus::Verified);
    assert_eq!(std::fs::read(&cache.destination).expect("read"), BODY);
    assert_eq!(cache.entries(), 1);
}

#[rstest]
fn existing_destination_is_reused_without_transfer(cache: Cache) {
    std::fs::write(&cache.destination, BODY).expect("seed");
    let mut transport = MockPackageTransport::new();
    transport.expect_download().never();

    let report = Downloader::new(&transport)
        .fetch(URL, &cache.destination, Some(&digest_of(BODY)))
        .expect("reused");

    assert!(report.reused);
    assert_eq!(report.attempts, 0);
    assert_eq!(report.checksum, ChecksumStatus::Verified);
}

#[rstest]
fn mismatch_is_accepted_with_warning_by_default(cache: Cache) {
    std::fs::write(&cache.destination, b"tampered").expect("seed");
    let mut transport = MockPackageTransport::new();
    transport.expect_download().never();

    let expected = digest_of(BODY);
    let report = Downloader::new(&transport)
        .fetch(URL, &cache.destination, Some(&expected))
        .expect("accepted");

    assert_eq!(
        report.checksum,
        ChecksumStatus::Mismatch {
            expected,
            actual: digest_of(b"tampered"),
        }
    );
    assert!(cache.destination.exists());
}

#[rstest]
fn strict_policy_rejects_and_removes_mismatch(cache: Cache) {
    let mut transport = MockPackageTransport::new();
    transport
        .expect_download()
        .times(1)
        .returning(|_, file| {
            file.write_all(b"tampered")?;
            Ok(8)
        });

    let err = Downloader::new(&transport)
        .with_checksum_policy(ChecksumPolicy::Strict)
        .fetch(URL, &cache.destination, Some(&digest_of(BODY)))
        .expect_err("rejected");

    assert!(matches!(err, DownloadError::ChecksumMismatch { .. }));
    assert!(!cache.destination.exists());
}

#[rstest]
#[case(0, true)]
#[case(4, true)]
#[case(5, false)]
fn default_policy_allows_five_attempts(#[case] made: u32, #[case] allowed: bool) {
    assert_eq!(RetryPolicy::default().allows(made), allowed);
}
