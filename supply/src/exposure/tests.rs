//! Tests for exposure planning, pkg-config rewriting, and the full pass.

use super::*;
use crate::test_utils::RecordingStager;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

const DEP_DIR: &str = "/home/vcap/deps/0";

fn link(source: &str, dest: &'static str) -> ExposureAction {
    ExposureAction::Link {
        source: Utf8PathBuf::from(DEP_DIR).join("apt").join(source),
        dest,
    }
}

fn copy(source: &str) -> ExposureAction {
    ExposureAction::CopyPkgConfig {
        source: Utf8PathBuf::from(DEP_DIR).join("apt").join(source),
        dest_dir: Utf8PathBuf::from(DEP_DIR).join("pkgconfig"),
    }
}

// -------------------------------------------------------------------------
// plan_exposure
// -------------------------------------------------------------------------

#[test]
fn plan_is_empty_for_empty_root() {
    assert!(plan_exposure(&BTreeSet::new(), Utf8Path::new(DEP_DIR)).is_empty());
}

#[test]
fn plan_covers_every_mapping_in_table_order() {
    let present: BTreeSet<&str> = LINK_MAPPINGS
        .iter()
        .chain(&PKGCONFIG_MAPPINGS)
        .map(|entry| entry.source)
        .collect();

    let actions = plan_exposure(&present, Utf8Path::new(DEP_DIR));

    assert_eq!(
        actions,
        [
            link("usr/bin", "bin"),
            link("usr/lib", "lib"),
            link("usr/lib/i386-linux-gnu", "lib"),
            link("usr/lib/x86_64-linux-gnu", "lib"),
            link("lib/x86_64-linux-gnu", "lib"),
            link("usr/include", "include"),
            copy("usr/lib/i386-linux-gnu/pkgconfig"),
            copy("usr/lib/x86_64-linux-gnu/pkgconfig"),
            copy("usr/lib/pkgconfig"),
        ]
    );
}

#[rstest]
#[case::arch_lib_only(&["usr/lib/x86_64-linux-gnu"], &["lib"])]
#[case::no_include(&["usr/bin", "usr/lib"], &["bin", "lib"])]
#[case::include_only(&["usr/include"], &["include"])]
#[case::pkgconfig_only(&["usr/lib/pkgconfig"], &[])]
fn plan_links_only_present_sources(#[case] present: &[&str], #[case] dests: &[&str]) {
    let set: BTreeSet<&str> = present.iter().copied().collect();
    let linked: Vec<&str> = plan_exposure(&set, Utf8Path::new(DEP_DIR))
        .iter()
        .filter_map(|action| match action {
            ExposureAction::Link { dest, .. } => Some(*dest),
            ExposureAction::CopyPkgConfig { .. } => None,
        })
        .collect();
    assert_eq!(linked, dests);
}

#[test]
fn plan_issues_one_link_for_arch_lib_dir() {
    let present = BTreeSet::from(["usr/lib/x86_64-linux-gnu"]);
    assert_eq!(
        plan_exposure(&present, Utf8Path::new(DEP_DIR)),
        [link("usr/lib/x86_64-linux-gnu", "lib")]
    );
}

// -------------------------------------------------------------------------
// rewrite_pkgconfig
// -------------------------------------------------------------------------

#[rstest]
#[case::leading_prefix("prefix=/usr\nName: cups\n", "prefix=/opt/apt/usr\nName: cups\n")]
#[case::every_match(
    "prefix=/usr\nlibdir=${prefix}/lib\nprefix=/usr\n",
    "prefix=/opt/apt/usr\nlibdir=${prefix}/lib\nprefix=/opt/apt/usr\n"
)]
#[case::longer_path("prefix=/usr/local\n", "prefix=/usr/local\n")]
#[case::indented("  prefix=/usr\n", "  prefix=/usr\n")]
#[case::no_trailing_newline("Name: cups\nprefix=/usr", "Name: cups\nprefix=/usr")]
#[case::crlf("prefix=/usr\r\n", "prefix=/usr\r\n")]
#[case::empty("", "")]
fn rewrite_replaces_only_exact_lines(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(
        rewrite_pkgconfig(input.as_bytes(), Utf8Path::new("/opt/apt")),
        expected.as_bytes()
    );
}

#[test]
fn rewrite_passes_non_utf8_bytes_through() {
    let rewritten = rewrite_pkgconfig(
        b"prefix=/usr\nDescription: caf\xe9\n",
        Utf8Path::new("/opt/apt"),
    );
    assert_eq!(rewritten, b"prefix=/opt/apt/usr\nDescription: caf\xe9\n");
}

#[test]
fn rewrite_is_noop_on_its_own_output() {
    let root = Utf8Path::new("/home/vcap/deps/0/apt");
    let once = rewrite_pkgconfig(b"prefix=/usr\nName: cups\n", root);
    assert!(!once.windows(PREFIX_TRIGGER.len()).any(|line| line == PREFIX_TRIGGER));
    assert_eq!(rewrite_pkgconfig(&once, root), once);
}

// -------------------------------------------------------------------------
// create_symlinks against a real install root
// -------------------------------------------------------------------------

struct DepTree {
    _temp: TempDir,
    dep_dir: Utf8PathBuf,
}

impl DepTree {
    fn install(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = install_root(&self.dep_dir).join(rel);
        let parent = path.parent().expect("file should have a parent");
        fs::create_dir_all(parent).expect("failed to create package dir");
        fs::write(&path, contents).expect("failed to write package file");
    }

    fn read_output(&self, rel: &str) -> String {
        fs::read_to_string(self.dep_dir.join(rel)).expect("failed to read output file")
    }
}

#[fixture]
fn dep_tree() -> DepTree {
    let temp = TempDir::new().expect("failed to create temp dir");
    let dep_dir =
        Utf8PathBuf::try_from(temp.path().join("deps/0")).expect("temp dir path not UTF-8");
    fs::create_dir_all(&dep_dir).expect("failed to create dep dir");
    DepTree {
        _temp: temp,
        dep_dir,
    }
}

#[rstest]
fn create_symlinks_is_noop_without_install_root(dep_tree: DepTree) {
    let stager = RecordingStager::new(&dep_tree.dep_dir);

    create_symlinks(&stager).expect("empty exposure should succeed");

    assert!(stager.links().is_empty());
    assert!(!dep_tree.dep_dir.join("pkgconfig").exists());
}

#[rstest]
fn create_symlinks_links_existing_sources_in_order(dep_tree: DepTree) {
    dep_tree.install("usr/bin/lp", "");
    dep_tree.install("usr/lib/x86_64-linux-gnu/libcups.so.2", "");
    dep_tree.install("lib/x86_64-linux-gnu/libz.so.1", "");
    let stager = RecordingStager::new(&dep_tree.dep_dir);

    create_symlinks(&stager).expect("exposure should succeed");

    let root = install_root(&dep_tree.dep_dir);
    assert_eq!(
        stager.links(),
        [
            (root.join("usr/bin"), "bin".to_owned()),
            (root.join("usr/lib"), "lib".to_owned()),
            (root.join("usr/lib/x86_64-linux-gnu"), "lib".to_owned()),
            (root.join("lib/x86_64-linux-gnu"), "lib".to_owned()),
        ]
    );
}

#[rstest]
fn create_symlinks_rewrites_cups_pkgconfig(dep_tree: DepTree) {
    dep_tree.install("usr/lib/pkgconfig/libcups.pc", "prefix=/usr\nName: cups\n");
    let stager = RecordingStager::new(&dep_tree.dep_dir);

    create_symlinks(&stager).expect("exposure should succeed");

    assert_eq!(
        dep_tree.read_output("pkgconfig/libcups.pc"),
        format!("prefix={}/apt/usr\nName: cups\n", dep_tree.dep_dir)
    );
}

#[rstest]
fn create_symlinks_copies_latin1_pkgconfig_unchanged(dep_tree: DepTree) {
    dep_tree.install("usr/lib/pkgconfig/latin1.pc", b"prefix=/usr\nDescription: caf\xe9\n");
    let stager = RecordingStager::new(&dep_tree.dep_dir);

    create_symlinks(&stager).expect("non-UTF-8 pkg-config should not abort exposure");

    let copied = fs::read(dep_tree.dep_dir.join("pkgconfig/latin1.pc"))
        .expect("latin1.pc should be copied");
    let mut expected = format!("prefix={}/apt/usr\n", dep_tree.dep_dir).into_bytes();
    expected.extend_from_slice(b"Description: caf\xe9\n");
    assert_eq!(copied, expected);
}

#[rstest]
fn later_pkgconfig_dir_wins_name_collisions(dep_tree: DepTree) {
    dep_tree.install("usr/lib/x86_64-linux-gnu/pkgconfig/zlib.pc", "Name: arch\n");
    dep_tree.install("usr/lib/x86_64-linux-gnu/pkgconfig/only-arch.pc", "Name: only\n");
    dep_tree.install("usr/lib/pkgconfig/zlib.pc", "Name: generic\n");
    let stager = RecordingStager::new(&dep_tree.dep_dir);

    create_symlinks(&stager).expect("exposure should succeed");

    assert_eq!(dep_tree.read_output("pkgconfig/zlib.pc"), "Name: generic\n");
    assert_eq!(dep_tree.read_output("pkgconfig/only-arch.pc"), "Name: only\n");
}

#[rstest]
fn pkgconfig_copy_skips_subdirectories(dep_tree: DepTree) {
    dep_tree.install("usr/lib/pkgconfig/nested/ignored.pc", "Name: nested\n");
    dep_tree.install("usr/lib/pkgconfig/top.pc", "Name: top\n");
    let root = install_root(&dep_tree.dep_dir);

    let written = copy_pkgconfig_dir(
        &root.join("usr/lib/pkgconfig"),
        &dep_tree.dep_dir.join("pkgconfig"),
        &root,
    )
    .expect("copy should succeed");

    assert_eq!(written, 1);
    assert!(!dep_tree.dep_dir.join("pkgconfig/nested").exists());
}

#[rstest]
fn link_failure_stops_before_pkgconfig_pass(dep_tree: DepTree) {
    dep_tree.install("usr/bin/lp", "");
    dep_tree.install("usr/include/cups/cups.h", "");
    dep_tree.install("usr/lib/pkgconfig/libcups.pc", "prefix=/usr\n");
    let stager = RecordingStager::new(&dep_tree.dep_dir).failing_on("bin");

    let err = create_symlinks(&stager).expect_err("link failure should abort");

    assert!(matches!(
        err,
        SupplyError::Filesystem {
            operation: FsOperation::Link,
            ..
        }
    ));
    assert_eq!(stager.link_dests(), ["bin"]);
    assert!(!dep_tree.dep_dir.join("pkgconfig").exists());
}

#[cfg(unix)]
#[rstest]
fn unwritable_dep_dir_is_mkdir_error(dep_tree: DepTree) {
    use std::os::unix::fs::PermissionsExt;

    // Root bypasses directory permissions.
    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    dep_tree.install("usr/lib/pkgconfig/libcups.pc", "prefix=/usr\n");
    fs::set_permissions(&dep_tree.dep_dir, fs::Permissions::from_mode(0o555))
        .expect("failed to make dep dir read-only");
    let stager = RecordingStager::new(&dep_tree.dep_dir);

    let result = create_symlinks(&stager);
    fs::set_permissions(&dep_tree.dep_dir, fs::Permissions::from_mode(0o755))
        .expect("failed to restore permissions");

    assert!(matches!(
        result,
        Err(SupplyError::Filesystem {
            operation: FsOperation::Mkdir,
            ..
        })
    ));
}
