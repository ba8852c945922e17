use flashimage_lib::progress::ProgressHelper;
use flashimage_lib::truncate::{resolve_block_size, truncate_flash_image, truncate_image};
use flashimage_lib::{Error, FatToolConfig, RecordedGraph, Script, TruncateSources};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn image(blocks: &[u8], block_size: usize) -> Vec<u8> {
    blocks
        .iter()
        .flat_map(|&fill| std::iter::repeat_n(fill, block_size))
        .collect()
}

#[test]
fn keeps_first_block_when_the_rest_is_erased() {
    let data = image(&[0x00, 0xFF, 0xFF, 0xFF], 16);
    let out = truncate_image(&data, 16).unwrap();
    assert_eq!(out, &data[..16]);
}

#[test]
fn keeps_one_block_of_an_all_erased_image() {
    let data = image(&[0xFF; 5], 32);
    let out = truncate_image(&data, 32).unwrap();
    assert_eq!(out.len(), 32);
    assert!(out.iter().all(|&b| b == 0xFF));
}

#[test]
fn single_block_is_returned_unchanged() {
    for fill in [0x00, 0x5A, 0xFF] {
        let data = image(&[fill], 64);
        assert_eq!(truncate_image(&data, 64).unwrap(), data.as_slice());
    }
}

#[test]
fn stops_at_last_used_block() {
    let data = image(&[0x11, 0xFF, 0x22, 0xFF, 0xFF], 8);
    let out = truncate_image(&data, 8).unwrap();
    assert_eq!(out.len(), 3 * 8);
    assert_eq!(out, &data[..24]);
}

#[test]
fn second_block_is_scanned_too() {
    let data = image(&[0x11, 0x22, 0xFF], 8);
    assert_eq!(truncate_image(&data, 8).unwrap().len(), 16);
}

#[test]
fn block_with_a_single_programmed_byte_is_kept() {
    let mut data = image(&[0x00, 0xFF, 0xFF, 0xFF], 16);
    data[2 * 16 + 7] = 0xFE;
    assert_eq!(truncate_image(&data, 16).unwrap().len(), 3 * 16);
}

#[test]
fn nothing_to_cut() {
    let data = image(&[0x01, 0x02, 0x03], 4);
    assert_eq!(truncate_image(&data, 4).unwrap(), data.as_slice());
}

#[test]
fn truncation_is_idempotent() {
    let data = image(&[0x10, 0xFF, 0x20, 0xFF, 0xFF, 0xFF], 32);
    let once = truncate_image(&data, 32).unwrap().to_vec();
    let twice = truncate_image(&once, 32).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn image_smaller_than_a_block() {
    let data = vec![0u8; 1000];
    match truncate_image(&data, 1024) {
        Err(Error::BlockTooSmall {
            file_size,
            block_size,
        }) => {
            assert_eq!(file_size, 1000);
            assert_eq!(block_size, 1024);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn image_not_a_multiple_of_the_block_size() {
    let data = vec![0u8; 1500];
    let err = truncate_image(&data, 1024).unwrap_err();
    assert!(matches!(
        err,
        Error::NotBlockMultiple {
            file_size: 1500,
            block_size: 1024
        }
    ));
    let message = err.to_string();
    assert!(message.contains("1500"));
    assert!(message.contains("1024"));
}

#[test]
fn block_size_precedence() {
    let script = Script::parse("-create 512 8\n");

    assert_eq!(resolve_block_size(Some("2048"), Some(&script)).unwrap(), 2048);
    assert_eq!(resolve_block_size(Some("0x100"), None).unwrap(), 256);
    assert_eq!(resolve_block_size(None, Some(&script)).unwrap(), 512);
    assert_eq!(resolve_block_size(None, None).unwrap(), 1024);
}

#[test]
fn block_size_from_hex_create() {
    let lower = Script::parse("# layout\n-create 0x400 16\n");
    let upper = Script::parse("-create 0X1000 16\n");

    assert_eq!(resolve_block_size(None, Some(&lower)).unwrap(), 0x400);
    assert_eq!(resolve_block_size(None, Some(&upper)).unwrap(), 0x1000);
}

#[test]
fn first_create_wins() {
    let script = Script::parse("-create 256 4\n-create 4096 4\n");
    assert_eq!(resolve_block_size(None, Some(&script)).unwrap(), 256);
}

#[test]
fn malformed_create_falls_through_to_next() {
    let script = Script::parse("-create 512K 4\n-create 0x200 4\n");
    assert_eq!(resolve_block_size(None, Some(&script)).unwrap(), 0x200);
}

#[test]
fn signed_sizes_are_rejected() {
    assert!(matches!(
        resolve_block_size(Some("+512"), None),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        resolve_block_size(Some("0x+1f"), None),
        Err(Error::InvalidInput(_))
    ));

    let signed = Script::parse("-create +512 4\n");
    assert!(matches!(
        resolve_block_size(None, Some(&signed)),
        Err(Error::Config(_))
    ));
}

#[test]
fn block_size_missing_from_config() {
    let script = Script::parse("-mount base.bin\n-writeraw a.bin 0\n");
    assert!(matches!(
        resolve_block_size(None, Some(&script)),
        Err(Error::Config(_))
    ));

    let garbage = Script::parse("-create size 4\n");
    assert!(matches!(
        resolve_block_size(None, Some(&garbage)),
        Err(Error::Config(_))
    ));
}

#[test]
fn zero_or_invalid_override() {
    assert!(matches!(
        resolve_block_size(Some("0"), None),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        resolve_block_size(Some("lots"), None),
        Err(Error::ParseInt(_))
    ));
}

#[test]
fn classify_sources() {
    let single = TruncateSources::classify(&["image.bin"]).unwrap();
    assert_eq!(single.image, PathBuf::from("image.bin"));
    assert_eq!(single.config, None);

    let pair = TruncateSources::classify(&["layout.ftc", "image.img"]).unwrap();
    assert_eq!(pair.image, PathBuf::from("image.img"));
    assert_eq!(pair.config, Some(PathBuf::from("layout.ftc")));
}

#[test]
fn classify_rejects_two_configs() {
    let err = TruncateSources::classify(&["a.ftc", "b.ftc"]).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("two config files"));
}

#[test]
fn classify_rejects_two_images() {
    let err = TruncateSources::classify(&["a.bin", "b.bin"]).unwrap_err();
    assert!(err.to_string().contains("two bin files"));
}

#[test]
fn classify_rejects_bad_source_counts() {
    let none: [&str; 0] = [];
    assert!(matches!(
        TruncateSources::classify(&none),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        TruncateSources::classify(&["a.bin", "b.ftc", "c.bin"]),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        TruncateSources::classify(&["only.ftc"]),
        Err(Error::Config(_))
    ));
}

fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[test]
fn truncates_with_block_size_from_config() {
    let dir = TempDir::new().unwrap();
    let config = write(
        dir.path(),
        "layout.ftc",
        b"-create 512\n-writeraw region.bin 0x0\n",
    );
    let mut data = vec![0xA5u8; 512];
    data.extend(std::iter::repeat_n(0xFF, 1024));
    let binary = write(dir.path(), "image.bin", &data);
    let target = dir.path().join("image_truncated.bin");

    let report = truncate_flash_image(
        &FatToolConfig::default(),
        &[config, binary],
        &target,
        &ProgressHelper::default(),
    )
    .unwrap();

    assert_eq!(report.block_size, 512);
    assert_eq!(report.original_len, 1536);
    assert_eq!(report.truncated_len, 512);
    assert_eq!(std::fs::read(&target).unwrap(), data[..512]);
}

#[test]
fn override_beats_config() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "layout.ftc", b"-create 512 3\n");
    let mut data = vec![0x00u8; 1024];
    data.extend(std::iter::repeat_n(0xFF, 1024));
    let binary = write(dir.path(), "image.bin", &data);
    let target = dir.path().join("out.bin");

    let report = truncate_flash_image(
        &FatToolConfig::default().with_block_size("1024"),
        &[binary, config],
        &target,
        &ProgressHelper::default(),
    )
    .unwrap();

    assert_eq!(report.block_size, 1024);
    assert_eq!(std::fs::read(&target).unwrap().len(), 1024);
}

#[test]
fn default_block_size_without_config() {
    let dir = TempDir::new().unwrap();
    let mut data = vec![0x00u8; 2048];
    data.extend(std::iter::repeat_n(0xFF, 2048));
    let binary = write(dir.path(), "image.bin", &data);
    let target = dir.path().join("out.bin");

    let report = truncate_flash_image(
        &FatToolConfig::default(),
        &[binary],
        &target,
        &ProgressHelper::default(),
    )
    .unwrap();

    assert_eq!(report.block_size, 1024);
    assert_eq!(report.truncated_len, 2048);
}

#[test]
fn bad_size_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let binary = write(dir.path(), "image.bin", &[0u8; 1500]);
    let target = dir.path().join("out.bin");

    let err = truncate_flash_image(
        &FatToolConfig::default(),
        &[binary],
        &target,
        &ProgressHelper::default(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::NotBlockMultiple { .. }));
    assert!(!target.exists());
}

#[test]
fn emitter_registers_block_size_override() {
    let mut graph = RecordedGraph::new();
    let target = Path::new("out.bin");
    flashimage_lib::truncate::emit_truncate(
        &FatToolConfig::default().with_block_size("0x800"),
        &["image.bin", "layout.ftc"],
        target,
        &mut graph,
    )
    .unwrap();

    assert_eq!(
        graph.dependencies_of(target).collect::<Vec<_>>(),
        vec![Path::new("image.bin"), Path::new("layout.ftc")]
    );
    assert_eq!(graph.values, vec![(target.to_path_buf(), "0x800".to_string())]);
}
