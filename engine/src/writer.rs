use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    error::{Error, Result},
    response::{Artifact, SegmentationMask},
};

const DEFAULT_EXTENSION: &str = "png";

/// `image/svg+xml` -> `svg`, `image/jpeg` -> `jpeg`
pub fn extension_for(content_type: &str) -> &str {
    content_type
        .split_once('/')
        .map(|(_, subtype)| subtype.split('+').next().unwrap_or(subtype).trim())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION)
}

/// `name.png` -> `name_3.png`, `name` -> `name_3`
pub fn indexed(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    path.with_file_name(name)
}

/// Target path of every artifact. `timestamp` is only used when no path was supplied, and is
/// shared by the whole batch.
pub fn artifact_paths(
    artifacts: &[Artifact],
    output: Option<&Path>,
    prefix: &str,
    timestamp: i64,
) -> Vec<PathBuf> {
    let single = artifacts.len() == 1;
    artifacts
        .iter()
        .enumerate()
        .map(|(i, artifact)| {
            let base = match output {
                Some(path) => path.to_path_buf(),
                None => PathBuf::from(format!(
                    "{prefix}_{timestamp}.{}",
                    extension_for(&artifact.content_type)
                )),
            };
            if single { base } else { indexed(&base, i + 1) }
        })
        .collect()
}

pub fn write_artifacts(
    artifacts: &[Artifact],
    output: Option<&Path>,
    prefix: &str,
) -> Result<Vec<PathBuf>> {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let paths = artifact_paths(artifacts, output, prefix, timestamp);

    for (artifact, path) in artifacts.iter().zip(&paths) {
        debug!("Writing {} bytes to {}", artifact.data.len(), path.display());
        fs::write(path, &artifact.data).map_err(|e| Error::io("write", path, e))?;
    }

    Ok(paths)
}

/// `mask_<index>_<label>.png`. The label is trimmed, then inner whitespace runs and path
/// separators are collapsed to a single `_`.
pub fn mask_file_name(index: usize, label: &str) -> String {
    let label = label
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    format!("mask_{index}_{label}.png")
}

pub fn write_masks(masks: &[SegmentationMask], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;

    masks
        .iter()
        .enumerate()
        .map(|(i, mask)| {
            let path = dir.join(mask_file_name(i + 1, &mask.label));
            fs::write(&path, &mask.mask_image).map_err(|e| Error::io("write", &path, e))?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    fn png(data: &[u8]) -> Artifact {
        Artifact {
            data: data.to_vec(),
            content_type: "image/png".into(),
        }
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/svg+xml"), "svg");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("garbage"), "png");
    }

    #[test]
    fn single_artifact_keeps_the_name() {
        let paths = artifact_paths(&[png(b"a")], Some(Path::new("out/cube.png")), "output", 0);
        assert_eq!(paths, vec![PathBuf::from("out/cube.png")]);
    }

    #[test]
    fn batch_is_indexed() {
        let artifacts = [png(b"a"), png(b"b"), png(b"c")];

        let paths = artifact_paths(&artifacts, Some(Path::new("cube.png")), "output", 0);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("cube_1.png"),
                PathBuf::from("cube_2.png"),
                PathBuf::from("cube_3.png"),
            ]
        );

        let paths = artifact_paths(&artifacts[..2], Some(Path::new("render")), "output", 0);
        assert_eq!(paths, vec![PathBuf::from("render_1"), PathBuf::from("render_2")]);
    }

    #[test]
    fn default_names_share_one_timestamp() {
        let artifacts = [
            png(b"a"),
            Artifact {
                data: b"b".to_vec(),
                content_type: "image/jpeg".into(),
            },
        ];
        let paths = artifact_paths(&artifacts, None, "edited", 1700000000123);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("edited_1700000000123_1.png"),
                PathBuf::from("edited_1700000000123_2.jpeg"),
            ]
        );

        let paths = artifact_paths(&artifacts[..1], None, "upscaled", 42);
        assert_eq!(paths, vec![PathBuf::from("upscaled_42.png")]);
    }

    #[test]
    fn artifacts_are_written() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("cube.png");

        let paths = write_artifacts(&[png(&[1, 2]), png(&[3])], Some(&target), "output")?;
        assert_eq!(fs::read(&paths[0]).unwrap(), vec![1, 2]);
        assert_eq!(fs::read(dir.path().join("cube_2.png")).unwrap(), vec![3]);
        Ok(())
    }

    #[test]
    fn mask_names() {
        assert_eq!(mask_file_name(1, "red car"), "mask_1_red_car.png");
        assert_eq!(mask_file_name(2, "  big \t dog "), "mask_2_big_dog.png");
        assert_eq!(mask_file_name(3, "a/b"), "mask_3_a_b.png");
    }

    #[test]
    fn masks_go_into_a_new_dir() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("masks");
        let masks = vec![
            SegmentationMask {
                label: "cat".into(),
                bounding_box: [0.0, 0.0, 1.0, 1.0],
                mask_image: vec![9],
            },
            SegmentationMask {
                label: "tabby cat".into(),
                bounding_box: [0.0, 0.0, 1.0, 1.0],
                mask_image: vec![8],
            },
        ];

        let paths = write_masks(&masks, &target)?;
        assert_eq!(paths[1], target.join("mask_2_tabby_cat.png"));
        assert_eq!(fs::read(target.join("mask_1_cat.png")).unwrap(), vec![9]);
        Ok(())
    }
}
