/* 📖 # Why does the CLI parse its own arguments?

The CLI is a thin shell over DiskFilesystem with one positional command and one or two
paths per invocation, so there is nothing for an argument-parsing crate to do.

Configuration comes from an optional `diskfs.toml` in the current directory:

```toml
prefix = "assets"
backend = "raw-handle"
```

Without it, paths resolve against the current directory and the platform's default backend is
used.

Exit codes:
- 0: Success
- 1: The operation failed
- 2: Usage error (unknown command or wrong number of arguments)
*/

use std::env;
use std::io::{self, Write};
use std::process;

use diskfs_base::tracing::init_tracing;
use diskfs_base::{FsResult, OsHandle, RealOs, err};
use diskfs_engine::{DiskFilesystem, FilesystemConfig, OpenMode, load_config};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "diskfs.toml";

const USAGE: &str = "\
Usage: diskfs <command> [args]

Commands:
  ls [dir]          List entries of a directory
  cat <file>        Print a file to stdout
  stat <path>       Show type, size and modification stamp
  mkdir <dir>       Create a directory (no error if it exists)
  rmdir <dir>       Delete an empty directory
  touch <file>      Create a file without truncating it
  rm <file>         Delete a file
  cp <src> <dst>    Copy a file";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List(String),
    Cat(String),
    Stat(String),
    MakeDirectory(String),
    RemoveDirectory(String),
    Touch(String),
    Remove(String),
    Copy(String, String),
}

impl Command {
    /// Parses the arguments after the program name. `None` means a usage error.
    fn parse(args: &[String]) -> Option<Self> {
        let (name, rest) = args.split_first()?;
        let command = match (name.as_str(), rest) {
            ("ls", []) => Command::List(".".to_string()),
            ("ls", [dir]) => Command::List(dir.clone()),
            ("cat", [file]) => Command::Cat(file.clone()),
            ("stat", [path]) => Command::Stat(path.clone()),
            ("mkdir", [dir]) => Command::MakeDirectory(dir.clone()),
            ("rmdir", [dir]) => Command::RemoveDirectory(dir.clone()),
            ("touch", [file]) => Command::Touch(file.clone()),
            ("rm", [file]) => Command::Remove(file.clone()),
            ("cp", [source, destination]) => Command::Copy(source.clone(), destination.clone()),
            _ => return None,
        };
        Some(command)
    }
}

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Warning: {}", e);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = Command::parse(&args) else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };

    let filesystem = match configured_filesystem() {
        Ok(filesystem) => filesystem,
        Err(e) => {
            eprintln!("Error: Failed to load config from {}: {}", CONFIG_FILE, e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&filesystem, &command, &mut out) {
        eprintln!("Error: {}", e);
        debug!("{:?}", e);
        process::exit(1);
    }
}

/// Builds the filesystem from `diskfs.toml` when it exists, defaults otherwise.
fn configured_filesystem() -> FsResult<DiskFilesystem> {
    let bootstrap = DiskFilesystem::real();
    let config = if bootstrap.is_file(CONFIG_FILE)? {
        load_config(&bootstrap, CONFIG_FILE)?
    } else {
        FilesystemConfig::default()
    };
    debug!(prefix = %config.prefix, backend = %config.backend, "filesystem configured");
    Ok(DiskFilesystem::from_config(
        OsHandle::new(RealOs::new()),
        &config,
    ))
}

fn run(filesystem: &DiskFilesystem, command: &Command, out: &mut impl Write) -> FsResult<()> {
    let write_error = |e: io::Error| err!("Failed to write output: {}", e);
    match command {
        Command::List(dir) => {
            for name in filesystem.list_files(dir)? {
                writeln!(out, "{}", name).map_err(write_error)?;
            }
        }
        Command::Cat(file) => {
            let mut handle = filesystem.open(file, OpenMode::Read)?;
            let mut content = Vec::new();
            handle.read_to_end(&mut content)?;
            filesystem.close(handle);
            out.write_all(&content).map_err(write_error)?;
        }
        Command::Stat(path) => stat(filesystem, path, out)?,
        Command::MakeDirectory(dir) => filesystem.create_directory(dir)?,
        Command::RemoveDirectory(dir) => filesystem.delete_directory(dir)?,
        Command::Touch(file) => filesystem.create_file(file)?,
        Command::Remove(file) => filesystem.delete_file(file)?,
        Command::Copy(source, destination) => {
            let bytes = copy(filesystem, source, destination)?;
            debug!(source = %source, destination = %destination, bytes, "copied");
        }
    }
    Ok(())
}

fn stat(filesystem: &DiskFilesystem, path: &str, out: &mut impl Write) -> FsResult<()> {
    let write_error = |e: io::Error| err!("Failed to write output: {}", e);
    let resolved = filesystem.absolute_path(path);
    if !filesystem.exists(path)? {
        return Err(err!("{} does not exist", resolved.display()));
    }

    writeln!(out, "path: {}", resolved.display()).map_err(write_error)?;
    if filesystem.is_directory(path)? {
        writeln!(out, "type: directory").map_err(write_error)?;
    } else {
        let mut handle = filesystem.open(path, OpenMode::Read)?;
        let size = handle.size()?;
        filesystem.close(handle);
        writeln!(out, "type: file").map_err(write_error)?;
        writeln!(out, "size: {}", size).map_err(write_error)?;
    }
    writeln!(out, "modified: {}", filesystem.last_modified_time(path)?).map_err(write_error)?;
    Ok(())
}

/// Streams `source` into `destination` and returns the number of bytes copied.
///
/// An existing destination file is removed first: write mode on the raw-handle backend keeps
/// old content past the new end.
fn copy(filesystem: &DiskFilesystem, source: &str, destination: &str) -> FsResult<u32> {
    if filesystem.absolute_path(source) == filesystem.absolute_path(destination) {
        return Err(err!("{} and {} are the same file", source, destination));
    }
    let mut input = filesystem.open(source, OpenMode::Read)?;
    if filesystem.is_file(destination)? {
        debug!(destination, "replacing existing file");
        filesystem.delete_file(destination)?;
    }
    let mut output = filesystem.open(destination, OpenMode::Write)?;

    let mut chunk = [0u8; 8192];
    let mut total: u32 = 0;
    loop {
        let bytes_read = input.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }
        output.write(&chunk[..bytes_read as usize])?;
        total = total.saturating_add(bytes_read);
    }
    output.flush()?;

    let expected = input.size()?;
    if total != expected {
        warn!(source, total, expected, "source changed during copy");
    }
    filesystem.close(output);
    filesystem.close(input);
    Ok(total)
}
