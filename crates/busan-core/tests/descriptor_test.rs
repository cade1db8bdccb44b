use busan_core::descriptor::read_version;
use busan_core::{BuildDescriptor, DESCRIPTOR_FILE_NAME, Error};
use proptest::prelude::*;
use tempfile::TempDir;

fn write_descriptor(dir: &std::path::Path, content: &str) {
    std::fs::write(dir.join(DESCRIPTOR_FILE_NAME), content).unwrap();
}

// ── Structure Tests ──

#[test]
fn locate_finds_descriptor_in_directory() {
    let tmp = TempDir::new().unwrap();
    write_descriptor(tmp.path(), "FROM alpine\n");

    let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();

    assert_eq!(descriptor.path(), tmp.path().join("Dockerfile"));
    assert_eq!(descriptor.context_dir(), tmp.path());
}

#[test]
fn locate_fails_for_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");

    let err = BuildDescriptor::locate(&missing).unwrap_err();

    assert!(matches!(err, Error::DirectoryNotFound { ref path } if *path == missing));
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn locate_fails_when_path_is_a_file() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("plain.txt");
    std::fs::write(&file, "x").unwrap();

    let err = BuildDescriptor::locate(&file).unwrap_err();

    assert!(matches!(err, Error::NotADirectory { .. }));
}

#[test]
fn locate_fails_without_descriptor() {
    let tmp = TempDir::new().unwrap();

    let err = BuildDescriptor::locate(tmp.path()).unwrap_err();

    assert!(matches!(err, Error::DescriptorNotFound { .. }));
}

#[test]
fn locate_fails_when_descriptor_is_directory() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(DESCRIPTOR_FILE_NAME)).unwrap();

    let err = BuildDescriptor::locate(tmp.path()).unwrap_err();

    assert!(matches!(err, Error::DescriptorIsDirectory { .. }));
}

// ── Version Marker Tests ──

#[test]
fn version_reads_marker() {
    let tmp = TempDir::new().unwrap();
    write_descriptor(tmp.path(), "# VERSION 1.2.3\nFROM alpine\n");

    let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();

    assert_eq!(descriptor.version().unwrap(), "1.2.3");
}

#[test]
fn version_first_marker_wins() {
    let tmp = TempDir::new().unwrap();
    write_descriptor(
        tmp.path(),
        "FROM alpine\n# VERSION 2.0\nRUN true\n# VERSION 3.0\n",
    );

    let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();

    assert_eq!(descriptor.version().unwrap(), "2.0");
}

#[test]
fn version_missing_marker_is_version_error() {
    let tmp = TempDir::new().unwrap();
    write_descriptor(tmp.path(), "FROM alpine\nRUN echo VERSION 1.0\n");

    let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();
    let err = descriptor.version().unwrap_err();

    assert!(matches!(err, Error::VersionNotFound { .. }));
    assert!(err.to_string().contains("VERSION comment"));
}

#[test]
fn version_empty_descriptor_is_version_error() {
    let tmp = TempDir::new().unwrap();
    write_descriptor(tmp.path(), "");

    let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();

    assert!(matches!(
        descriptor.version(),
        Err(Error::VersionNotFound { .. })
    ));
}

#[test]
fn version_tolerates_non_utf8_bytes_before_marker() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(DESCRIPTOR_FILE_NAME),
        b"FROM alpine\nLABEL author=\"Ren\xe9\"\n# VERSION 1.2.3\n",
    )
    .unwrap();

    let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();

    assert_eq!(descriptor.version().unwrap(), "1.2.3");
}

#[test]
fn version_handles_crlf_line_endings() {
    let tmp = TempDir::new().unwrap();
    write_descriptor(tmp.path(), "FROM alpine\r\n# VERSION 2.0\r\n");

    let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();

    assert_eq!(descriptor.version().unwrap(), "2.0");
}

#[test]
fn version_io_failure_surfaces_read_error() {
    let tmp = TempDir::new().unwrap();

    // Opening a directory succeeds, reading from it does not.
    let result = read_version(tmp.path());

    assert!(matches!(result, Err(Error::DescriptorRead { .. })));
}

proptest! {
    #[test]
    fn any_dotted_version_is_extracted(
        parts in proptest::collection::vec(0u32..1000, 1..5),
        preamble in "[A-Z ]{0,20}",
    ) {
        let version = parts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");
        let tmp = TempDir::new().unwrap();
        write_descriptor(
            tmp.path(),
            &format!("FROM scratch {preamble}\n# VERSION {version}\nCMD [\"run\"]\n"),
        );

        let descriptor = BuildDescriptor::locate(tmp.path()).unwrap();
        prop_assert_eq!(descriptor.version().unwrap(), version);
    }
}
