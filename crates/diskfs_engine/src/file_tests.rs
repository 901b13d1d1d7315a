/* 📖 # File handle conformance tests

Both backends promise the same cursor and round-trip behaviour and differ only in
truncation and end-of-file reporting. The shared scenarios run once per backend through
the DiskFilesystem facade; the differences are asserted explicitly.
*/

#[cfg(test)]
mod conformance_tests {
    use std::fs;
    use std::path::PathBuf;

    use diskfs_base::{MockOs, OsHandle};
    use expect_test::expect;
    use tempfile::TempDir;

    use crate::file::{Backend, FileHandle, OpenMode};
    use crate::filesystem::DiskFilesystem;

    const BACKENDS: [Backend; 2] = [Backend::BufferedStream, Backend::RawHandle];

    fn filesystem(temp_dir: &TempDir, backend: Backend) -> DiskFilesystem {
        let mut filesystem = DiskFilesystem::real().with_backend(backend);
        filesystem.set_prefix(temp_dir.path());
        filesystem
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_round_trip() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            let filesystem = filesystem(&temp_dir, backend);
            let payload = pattern(1000);

            let mut file = filesystem.open("blob.bin", OpenMode::Write).unwrap();
            assert_eq!(file.write(&payload).unwrap(), 1000);
            file.flush().unwrap();
            filesystem.close(file);

            let mut file = filesystem.open("blob.bin", OpenMode::Read).unwrap();
            assert_eq!(file.size().unwrap(), 1000, "{backend}");
            let mut buffer = vec![0u8; 1000];
            assert_eq!(file.read(&mut buffer).unwrap(), 1000, "{backend}");
            assert_eq!(buffer, payload, "{backend}");
        }
    }

    #[test]
    fn test_cursor_tracks_reads_seeks_and_skips() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("data.bin"), pattern(64)).unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("data.bin", OpenMode::Read).unwrap();
            assert_eq!(file.position().unwrap(), 0, "{backend}");

            let mut buffer = [0u8; 10];
            file.read(&mut buffer).unwrap();
            assert_eq!(file.position().unwrap(), 10, "{backend}");

            file.skip(6).unwrap();
            assert_eq!(file.position().unwrap(), 16, "{backend}");
            file.read(&mut buffer[..1]).unwrap();
            assert_eq!(buffer[0], 16, "{backend}");

            file.seek(40).unwrap();
            assert_eq!(file.position().unwrap(), 40, "{backend}");

            assert_eq!(file.size().unwrap(), 64, "{backend}");
            assert_eq!(file.position().unwrap(), 40, "{backend}");

            file.seek_to_end().unwrap();
            assert_eq!(file.position().unwrap(), 64, "{backend}");
        }
    }

    #[test]
    fn test_short_read_at_end_of_file() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("data.bin"), b"abcdef").unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("data.bin", OpenMode::Read).unwrap();
            file.seek(4).unwrap();
            let mut buffer = [0u8; 8];
            assert_eq!(file.read(&mut buffer).unwrap(), 2, "{backend}");
            assert_eq!(&buffer[..2], b"ef", "{backend}");
            assert_eq!(file.read(&mut buffer).unwrap(), 0, "{backend}");
            assert!(file.end_of_file().unwrap(), "{backend}");
        }
    }

    #[test]
    fn test_seek_to_end_does_not_set_end_of_file() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("data.bin"), b"abc").unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("data.bin", OpenMode::Read).unwrap();
            assert!(!file.end_of_file().unwrap(), "{backend}");
            file.seek_to_end().unwrap();
            assert!(!file.end_of_file().unwrap(), "{backend}");

            let mut buffer = [0u8; 4];
            assert_eq!(file.read(&mut buffer).unwrap(), 0, "{backend}");
            assert!(file.end_of_file().unwrap(), "{backend}");
        }
    }

    #[test]
    fn test_fresh_empty_file_is_not_at_end_of_file() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("empty.bin"), b"").unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("empty.bin", OpenMode::Read).unwrap();
            assert!(!file.end_of_file().unwrap(), "{backend}");
        }
    }

    #[test]
    fn test_end_of_file_after_short_read_differs_per_backend() {
        let expected = [(Backend::BufferedStream, true), (Backend::RawHandle, false)];
        for (backend, end_of_file) in expected {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("data.bin"), b"abc").unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("data.bin", OpenMode::Read).unwrap();
            let mut buffer = [0u8; 8];
            assert_eq!(file.read(&mut buffer).unwrap(), 3, "{backend}");
            assert_eq!(file.end_of_file().unwrap(), end_of_file, "{backend}");
        }
    }

    #[test]
    fn test_seek_back_after_end_of_file_differs_per_backend() {
        let expected = [(Backend::BufferedStream, false), (Backend::RawHandle, true)];
        for (backend, end_of_file) in expected {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("data.bin"), b"abc").unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("data.bin", OpenMode::Read).unwrap();
            file.seek_to_end().unwrap();
            file.read(&mut [0u8; 1]).unwrap();
            assert!(file.end_of_file().unwrap(), "{backend}");

            file.seek(0).unwrap();
            assert_eq!(file.end_of_file().unwrap(), end_of_file, "{backend}");
        }
    }

    #[test]
    fn test_write_mode_truncation_differs_per_backend() {
        let expected = [
            (Backend::BufferedStream, &b"XY"[..]),
            (Backend::RawHandle, &b"XY2345"[..]),
        ];
        for (backend, content) in expected {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("save.bin"), b"012345").unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("save.bin", OpenMode::Write).unwrap();
            file.write(b"XY").unwrap();
            filesystem.close(file);

            assert_eq!(
                fs::read(temp_dir.path().join("save.bin")).unwrap(),
                content,
                "{backend}"
            );
        }
    }

    #[test]
    fn test_open_missing_file_for_read_fails() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let error = filesystem.open("missing.bin", OpenMode::Read).unwrap_err();
            assert_eq!(
                error.path(),
                Some(temp_dir.path().join("missing.bin").as_path())
            );
            assert!(error.native_code().is_some(), "{backend}");
            assert!(!temp_dir.path().join("missing.bin").exists());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_open_error_display() {
        let filesystem =
            DiskFilesystem::new(OsHandle::new(MockOs::new())).with_backend(Backend::BufferedStream);
        let error = filesystem
            .open("/nonexistent-diskfs-dir/a.bin", OpenMode::Read)
            .unwrap_err();
        let message = error.to_string();
        let prefix = message.split(": ").next().unwrap_or_default();
        expect!["Failed to open /nonexistent-diskfs-dir/a.bin"].assert_eq(prefix);
    }

    #[test]
    fn test_close_is_idempotent() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("data.bin"), b"abc").unwrap();

            let mut handle = backend.new_handle();
            handle.close();
            handle
                .open(&temp_dir.path().join("data.bin"), OpenMode::Read)
                .unwrap();
            assert!(handle.is_open(), "{backend}");
            handle.close();
            handle.close();
            assert!(!handle.is_open(), "{backend}");
        }
    }

    #[test]
    fn test_failed_open_leaves_handle_closed_and_reusable() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            fs::write(temp_dir.path().join("data.bin"), b"abc").unwrap();

            let mut handle = backend.new_handle();
            assert!(
                handle
                    .open(&temp_dir.path().join("missing.bin"), OpenMode::Read)
                    .is_err()
            );
            assert!(!handle.is_open(), "{backend}");
            handle.close();

            handle
                .open(&temp_dir.path().join("data.bin"), OpenMode::Read)
                .unwrap();
            assert_eq!(handle.size().unwrap(), 3, "{backend}");
        }
    }

    #[test]
    fn test_open_file_reports_resolved_path() {
        let temp_dir = TempDir::new().unwrap();
        let filesystem = filesystem(&temp_dir, Backend::platform_default());
        filesystem.create_directory("levels").unwrap();

        let file = filesystem
            .open("levels/intro.bin", OpenMode::Write)
            .unwrap();
        let expected: PathBuf = temp_dir.path().join("levels").join("intro.bin");
        assert_eq!(file.path(), expected.as_path());
    }

    #[test]
    fn test_read_to_end() {
        for backend in BACKENDS {
            let temp_dir = TempDir::new().unwrap();
            let payload = pattern(10_000);
            fs::write(temp_dir.path().join("big.bin"), &payload).unwrap();
            let filesystem = filesystem(&temp_dir, backend);

            let mut file = filesystem.open("big.bin", OpenMode::Read).unwrap();
            file.seek(100).unwrap();
            let mut out = Vec::new();
            assert_eq!(file.read_to_end(&mut out).unwrap(), 9_900, "{backend}");
            assert_eq!(out, payload[100..], "{backend}");
        }
    }

    #[test]
    fn test_existence_semantics_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let filesystem = filesystem(&temp_dir, Backend::platform_default());

        filesystem.create_directory("saves").unwrap();
        filesystem.create_directory("saves").unwrap();
        assert!(filesystem.is_directory("saves").unwrap());
        assert!(!filesystem.is_file("saves").unwrap());

        filesystem.create_file("saves/slot1.bin").unwrap();
        assert!(filesystem.exists("saves/slot1.bin").unwrap());
        assert!(filesystem.is_file("saves/slot1.bin").unwrap());
        assert!(!filesystem.is_directory("saves/slot1.bin").unwrap());
        assert_eq!(filesystem.list_files("saves").unwrap(), vec!["slot1.bin"]);
        assert!(filesystem.last_modified_time("saves/slot1.bin").unwrap() > 0);

        assert!(filesystem.delete_directory("saves").is_err());
        filesystem.delete_file("saves/slot1.bin").unwrap();
        assert!(!filesystem.exists("saves/slot1.bin").unwrap());
        filesystem.delete_directory("saves").unwrap();
        assert!(!filesystem.exists("saves").unwrap());
    }

    #[test]
    fn test_create_file_keeps_content() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("keep.bin"), b"abc").unwrap();
        let filesystem = filesystem(&temp_dir, Backend::platform_default());

        filesystem.create_file("keep.bin").unwrap();
        assert_eq!(fs::read(temp_dir.path().join("keep.bin")).unwrap(), b"abc");
    }

    fn closed_handle(backend: Backend) -> Box<dyn FileHandle> {
        backend.new_handle()
    }

    #[test]
    #[should_panic(expected = "file handle is not open")]
    fn test_buffered_read_on_closed_handle_panics() {
        let mut buffer = [0u8; 1];
        let _ = closed_handle(Backend::BufferedStream).read(&mut buffer);
    }

    #[test]
    #[should_panic(expected = "file handle is not open")]
    fn test_raw_size_on_closed_handle_panics() {
        let _ = closed_handle(Backend::RawHandle).size();
    }

    #[test]
    #[should_panic(expected = "file handle is not open")]
    fn test_raw_end_of_file_on_closed_handle_panics() {
        let _ = closed_handle(Backend::RawHandle).end_of_file();
    }

    #[test]
    #[should_panic(expected = "file handle is already open")]
    fn test_double_open_panics() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        fs::write(&path, b"abc").unwrap();

        let mut handle = Backend::RawHandle.new_handle();
        handle.open(&path, OpenMode::Read).unwrap();
        let _ = handle.open(&path, OpenMode::Read);
    }

    #[test]
    #[should_panic(expected = "file handle is not open")]
    fn test_write_after_close_panics() {
        let temp_dir = TempDir::new().unwrap();
        let filesystem = filesystem(&temp_dir, Backend::BufferedStream);

        let mut file = filesystem.open("out.bin", OpenMode::Write).unwrap();
        file.close();
        let _ = file.write(b"late");
    }
}
