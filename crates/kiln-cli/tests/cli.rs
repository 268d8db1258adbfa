//! End-to-end tests driving the `kiln` binary.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Runs the binary from an empty scratch directory with a clean environment.
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        Self { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn kiln_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_kiln"));
        cmd.current_dir(self.path())
            .env("KILN_CONFIG", self.path().join("kiln.toml"))
            .env_remove("KILN_COMPILER")
            .env_remove("KILN_TRUNK_DIR")
            .env_remove("KILN_PACKAGES_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.kiln_cmd().args(args).output().expect("failed to run kiln")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_flags_opt_build() {
    let ctx = TestContext::new();
    let output = ctx.run(&[
        "flags",
        "--build-id",
        "opt-fast",
        "--cpu",
        "nehalem",
        "--compiler-version",
        "5.0.0",
        "--host",
        "linux",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let flags = stdout(&output);
    let flags: Vec<&str> = flags.split_whitespace().collect();
    assert_eq!(&flags[..3], &["-pipe", "-std=c++11", "-ggdb"]);
    assert!(flags.contains(&"-O3"));
    assert!(!flags.contains(&"-Ofast"));
    assert!(flags.contains(&"-malign-data=cacheline"));
    assert!(flags.ends_with(&["-march=corei7", "-m64"]));
}

#[test]
fn test_flags_unknown_cpu_warns() {
    let ctx = TestContext::new();
    let output = ctx.run(&["flags", "-b", "fast", "--compiler-version", "4.9"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("-mtune=generic"));
    assert!(stderr(&output).contains("warning:"));
}

#[test]
fn test_flags_unsupported_compiler() {
    let ctx = TestContext::new();
    let output = ctx.run(&["flags", "-b", "debug", "--compiler-version", "4.7.0"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("4.7.0"));
}

#[test]
fn test_flags_json() {
    let ctx = TestContext::new();
    let output = ctx.run(&[
        "flags",
        "-b",
        "opt",
        "--cpu",
        "mystery",
        "--compiler-version",
        "6.1.0",
        "--json",
    ]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let flags = value["flags"].as_array().unwrap();
    assert!(flags.iter().any(|f| f == "-march=native"));
    assert_eq!(value["diagnostics"][0]["kind"], "native-arch-fallback");
}

#[test]
fn test_flags_missing_compiler_binary() {
    let ctx = TestContext::new();
    let output = ctx.run(&[
        "flags",
        "-b",
        "opt",
        "--compiler",
        "kiln-test-no-such-compiler",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("kiln-test-no-such-compiler"));
}

#[test]
fn test_cpus_lists_known_ids() {
    let ctx = TestContext::new();
    let output = ctx.run(&["cpus", "--host", "darwin"]);
    assert!(output.status.success());

    let listing = stdout(&output);
    assert_eq!(listing.lines().count(), 33);
    assert!(listing.lines().any(|l| l.starts_with("cortexa15")));
    assert!(listing.contains("-msse4.2"));
}

#[test]
fn test_thirdparty_list() {
    let ctx = TestContext::new();
    let output = ctx.run(&["thirdparty", "list"]);
    assert!(output.status.success());

    let listing = stdout(&output);
    for name in ["fparser", "half", "triangle"] {
        assert!(listing.contains(name), "missing {name}");
    }
}

#[test]
fn test_thirdparty_cmake_flags() {
    let ctx = TestContext::new();
    let output = ctx.run(&["thirdparty", "cmake-flags", "triangle", "fparser"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        "-DFEAT_HAVE_TRIANGLE:BOOL=ON -DFEAT_HAVE_FPARSER:BOOL=ON"
    );

    let output = ctx.run(&["thirdparty", "cmake-flags", "zoltan"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("zoltan"));
}

#[test]
fn test_thirdparty_show_from_packages_dir() {
    let ctx = TestContext::new();
    let packages = ctx.path().join("packages");
    std::fs::create_dir_all(&packages).unwrap();
    std::fs::write(
        packages.join("zoltan.toml"),
        r#"
names = ["zoltan"]
dirname = "zoltan"
filename = "zoltan.zip"
url = "https://example.org/zoltan.zip"
cmake_flags = "-DFEAT_HAVE_ZOLTAN:BOOL=ON"
"#,
    )
    .unwrap();
    std::fs::write(ctx.path().join("kiln.toml"), "packages_dir = \"packages\"\n").unwrap();

    let output = ctx.run(&["thirdparty", "show", "zoltan"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("https://example.org/zoltan.zip"));
}

#[test]
fn test_preprocess_requires_source() {
    let ctx = TestContext::new();
    let output = ctx.run(&["preprocess"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Usage"));
}

#[test]
fn test_preprocess_rejects_extra_arguments() {
    let ctx = TestContext::new();
    let output = ctx.run(&["preprocess", "a.c", "b.c", "c.c"]);
    assert!(!output.status.success());
}

#[test]
fn test_preprocess_default_output() {
    let ctx = TestContext::new();
    std::fs::write(
        ctx.path().join("hyperelastic.c"),
        "> CodeGeneration[C](e);\nt1 = grad[0][1] * 0.2e1;\n",
    )
    .unwrap();

    let output = ctx.run(&["preprocess", "hyperelastic.c"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let written = std::fs::read_to_string(ctx.path().join("preprocessed_hyperelastic.c")).unwrap();
    assert_eq!(written, "t1 = grad(0,1) * DataType(2);\n");
}

#[test]
fn test_preprocess_explicit_output() {
    let ctx = TestContext::new();
    std::fs::write(ctx.path().join("in.c"), "t = sqrt(fac_reg);\n").unwrap();

    let output = ctx.run(&["preprocess", "in.c", "out.c"]);
    assert!(output.status.success());
    assert_eq!(
        std::fs::read_to_string(ctx.path().join("out.c")).unwrap(),
        "t = Math::sqrt(this->_fac_reg);\n"
    );
}
