//! JSON scene summary for `--dump-scene`, useful when checking starfield
//! seeds and object placement without opening a window.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use orion_scene::OrionScene;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SceneSummary {
    pub object_count: usize,
    pub star_count: usize,
    pub constellation_count: usize,
    pub objects: Vec<ObjectSummary>,
}

#[derive(Debug, Serialize)]
pub struct ObjectSummary {
    pub id: u32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub interactive: bool,
}

pub fn summarize_scene(scene: &OrionScene) -> SceneSummary {
    let objects: Vec<ObjectSummary> = scene
        .objects()
        .iter()
        .map(|object| ObjectSummary {
            id: object.id.0,
            kind: object.kind.label(),
            name: object.name,
            position: object.position.to_array(),
            color: object.color,
            interactive: object.id == scene.interactive_id(),
        })
        .collect();

    let star_count = objects.iter().filter(|o| o.kind == "star").count();
    let constellation_count = objects
        .iter()
        .filter(|o| o.kind == "constellation-star")
        .count();

    SceneSummary {
        object_count: objects.len(),
        star_count,
        constellation_count,
        objects,
    }
}

pub fn write_scene_summary(scene: &OrionScene, path: &Path) -> Result<()> {
    let summary = summarize_scene(scene);
    let file = File::create(path)
        .with_context(|| format!("creating scene summary {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &summary)
        .with_context(|| format!("writing scene summary {}", path.display()))?;
    log::info!(
        "scene summary written to {} ({} objects)",
        path.display(),
        summary.object_count
    );
    Ok(())
}

#[cfg(test)]
mod summary_tests {
    use super::*;
    use orion_scene::SceneConfig;

    #[test]
    fn summary_counts_match_the_scene() {
        let scene = OrionScene::build(&SceneConfig {
            star_count: 25,
            star_seed: Some(11),
        });
        let summary = summarize_scene(&scene);
        assert_eq!(summary.object_count, scene.objects().len());
        assert_eq!(summary.star_count, 25);
        assert_eq!(summary.constellation_count, 7);
        assert_eq!(
            summary.objects.iter().filter(|o| o.interactive).count(),
            1
        );
    }

    #[test]
    fn summary_serializes_named_markers() {
        let scene = OrionScene::build(&SceneConfig {
            star_count: 0,
            star_seed: Some(11),
        });
        let summary = summarize_scene(&scene);
        let json = serde_json::to_string(&summary).expect("serialize");
        assert!(json.contains("Betelgeuse"));
        assert!(json.contains("constellation-star"));
    }
}
