//! Run the built binaries and check exit codes, diagnostics and files left behind.
use std::ffi::OsStr;
use std::fs;
use std::process::{Command, Output};

const DEFLATE: &str = env!("CARGO_BIN_EXE_mmap-deflate");
const INFLATE: &str = env!("CARGO_BIN_EXE_mmap-inflate");
const ZSTD_C: &str = env!("CARGO_BIN_EXE_mmap-zstd-compress");
const ZSTD_D: &str = env!("CARGO_BIN_EXE_mmap-zstd-decompress");
const LZ4_C: &str = env!("CARGO_BIN_EXE_mmap-lz4-compress");
const LZ4_D: &str = env!("CARGO_BIN_EXE_mmap-lz4-decompress");

fn run<I, S>(exe: &str, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(exe).args(args).output().unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn round_trip_test() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("peter.txt");
    let packed = dir.path().join("peter.txt.z");
    let unpacked = dir.path().join("peter.out");
    let text = b"Peter Piper picked a peck of pickled peppers.\n".repeat(5000);
    fs::write(&original, &text).unwrap();

    let out = run(DEFLATE, &[&original, &packed]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(out.stdout.is_empty());

    let out = run(INFLATE, &[&packed, &unpacked]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read(&unpacked).unwrap(), text);
}

#[test]
fn level_and_strategy_test() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("in");
    let packed = dir.path().join("in.z");
    let unpacked = dir.path().join("out");
    fs::write(&original, b"aaaaaaaaaabbbbbbbbbbcccccccccc".repeat(300)).unwrap();

    let args = [
        "--level=1",
        "--strategy=huffman-only",
        original.to_str().unwrap(),
        packed.to_str().unwrap(),
    ];
    let out = run(DEFLATE, &args);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = run(INFLATE, &[&packed, &unpacked]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read(&unpacked).unwrap(), fs::read(&original).unwrap());
}

#[test]
fn bad_arguments_test() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("in");
    let packed = dir.path().join("in.z");
    fs::write(&original, b"data").unwrap();
    let input = original.to_str().unwrap();
    let output = packed.to_str().unwrap();

    for bad in ["--level=10", "--level=abc", "--strategy=bogus", "--nope"] {
        let out = run(DEFLATE, &[bad, input, output]);
        assert_eq!(out.status.code(), Some(1), "{}", bad);
        let msg = stderr(&out);
        assert!(msg.starts_with("mmap-deflate: error: "), "{}", msg);
        assert_eq!(msg.trim_end().lines().count(), 1, "{}", msg);
        assert!(!packed.exists());
    }
}

#[test]
fn missing_argument_test() {
    let out = run(INFLATE, Vec::<&str>::new());
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr(&out).trim_end(),
        "mmap-inflate: error: missing argument INPUT_FILE"
    );

    let out = run(DEFLATE, &["only-one"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("missing argument OUTPUT_FILE"));
}

#[test]
fn help_and_version_test() {
    for exe in [DEFLATE, INFLATE, ZSTD_C, ZSTD_D, LZ4_C, LZ4_D] {
        let out = run(exe, &["--help"]);
        assert!(out.status.success());
        assert!(String::from_utf8_lossy(&out.stdout).contains("INPUT_FILE"));

        for flag in ["-v", "--version"] {
            let out = run(exe, &[flag]);
            assert!(out.status.success());
            let text = String::from_utf8_lossy(&out.stdout).into_owned();
            assert!(text.trim_end().ends_with(env!("CARGO_PKG_VERSION")), "{}", text);
        }
    }
}

#[test]
fn same_file_test() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    fs::write(&path, b"precious bytes").unwrap();

    let out = run(DEFLATE, &[&path, &path]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("are the same file"));
    assert_eq!(fs::read(&path).unwrap(), b"precious bytes");
}

#[test]
fn missing_input_test() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    let out = run(INFLATE, &[&dir.path().join("nope"), &output]);
    assert_eq!(out.status.code(), Some(1));
    let msg = stderr(&out);
    assert!(msg.starts_with("mmap-inflate: error: couldn't open file"), "{}", msg);
    assert!(msg.contains("os error 2"), "{}", msg);
    assert!(!output.exists());
}

#[test]
fn corrupt_input_test() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("junk.z");
    let output = dir.path().join("junk");
    fs::write(&input, b"this is not a zlib stream at all").unwrap();

    let out = run(INFLATE, &[&input, &output]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("couldn't inflate stream"));
    assert!(!output.exists());
}

#[test]
fn verbose_logs_to_stderr_test() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("in");
    let packed = dir.path().join("in.z");
    fs::write(&original, b"some bytes to squeeze").unwrap();

    let args = [
        "--verbose",
        original.to_str().unwrap(),
        packed.to_str().unwrap(),
    ];
    let out = run(DEFLATE, &args);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert!(!out.stderr.is_empty());
}

#[test]
fn repeated_verbose_test() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("in");
    let packed = dir.path().join("in.z");
    let unpacked = dir.path().join("out");
    fs::write(&original, b"trace everything, twice over".repeat(100)).unwrap();

    let steps = [(DEFLATE, &original, &packed), (INFLATE, &packed, &unpacked)];
    for (exe, input, output) in steps {
        let args = [
            "--verbose",
            "--verbose",
            "--verbose",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
        ];
        let out = run(exe, &args);
        assert!(out.status.success(), "{}", stderr(&out));
        assert!(out.stdout.is_empty());
        assert!(!out.stderr.is_empty());
    }
    assert_eq!(fs::read(&unpacked).unwrap(), fs::read(&original).unwrap());
}

#[test]
fn other_formats_round_trip_test() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("peter.txt");
    let text = b"Peter Piper picked a peck of pickled peppers.\n".repeat(50_000);
    fs::write(&original, &text).unwrap();

    let settings: [(&str, &str, &[&str]); 4] = [
        (ZSTD_C, ZSTD_D, &[]),
        (ZSTD_C, ZSTD_D, &["--level=-3", "--strategy=btultra2"]),
        (LZ4_C, LZ4_D, &[]),
        (LZ4_C, LZ4_D, &["--block-size=256KB", "--block-mode=independent"]),
    ];
    for (compress, decompress, options) in settings {
        let packed = dir.path().join("packed");
        let unpacked = dir.path().join("unpacked");

        let mut args: Vec<&str> = options.to_vec();
        args.push(original.to_str().unwrap());
        args.push(packed.to_str().unwrap());
        let out = run(compress, &args);
        assert!(out.status.success(), "{:?}: {}", options, stderr(&out));
        assert!(fs::metadata(&packed).unwrap().len() < text.len() as u64);

        let out = run(decompress, &[&packed, &unpacked]);
        assert!(out.status.success(), "{:?}: {}", options, stderr(&out));
        assert_eq!(fs::read(&unpacked).unwrap(), text);
    }
}

#[test]
fn other_formats_bad_arguments_test() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("in");
    let packed = dir.path().join("in.packed");
    fs::write(&original, b"data").unwrap();
    let input = original.to_str().unwrap();
    let output = packed.to_str().unwrap();

    let cases = [
        (ZSTD_C, "mmap-zstd-compress", "--level=23"),
        (ZSTD_C, "mmap-zstd-compress", "--strategy=bogus"),
        (LZ4_C, "mmap-lz4-compress", "--block-size=2MB"),
        (LZ4_C, "mmap-lz4-compress", "--block-mode=bogus"),
    ];
    for (exe, name, bad) in cases {
        let out = run(exe, &[bad, input, output]);
        assert_eq!(out.status.code(), Some(1), "{}", bad);
        let msg = stderr(&out);
        assert!(msg.starts_with(&format!("{}: error: ", name)), "{}", msg);
        assert_eq!(msg.trim_end().lines().count(), 1, "{}", msg);
        assert!(!packed.exists());
    }
}

#[test]
fn other_formats_corrupt_input_test() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("junk");
    let output = dir.path().join("junk.out");
    fs::write(&input, b"this is neither a zstd nor an lz4 frame").unwrap();

    for (exe, codec) in [(ZSTD_D, "zstd-decompress"), (LZ4_D, "lz4-decompress")] {
        let out = run(exe, &[&input, &output]);
        assert_eq!(out.status.code(), Some(1));
        assert!(stderr(&out).contains(&format!("couldn't {} stream", codec)));
        assert!(!output.exists());
    }
}
