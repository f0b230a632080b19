use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::graph_utils::galaxy::{GalaxyStore, NoteSeed};
use crate::graph_utils::style::LinkStyle;

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write nodes and links as one pretty JSON document.
pub fn export_galaxy_json(store: &GalaxyStore, path: &Path) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct GalaxyOut<'a> {
        nodes: Vec<&'a crate::graph_utils::galaxy::Node>,
        links: Vec<&'a crate::graph_utils::galaxy::Link>,
    }
    let out = GalaxyOut {
        nodes: store.nodes.values().collect(),
        links: store.links.values().collect(),
    };
    ensure_parent(path)?;
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&out)?;
    f.write_all(s.as_bytes())?;
    log::info!("exported galaxy json to {}", path.display());
    Ok(())
}

/// Write `<base>_nodes.csv` and `<base>_links.csv` next to `base_path`.
pub fn export_galaxy_csv(store: &GalaxyStore, base_path: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let stem = base_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("galaxy")
        .to_string();
    let dir = base_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let nodes_path = dir.join(format!("{}_nodes.csv", stem));
    let links_path = dir.join(format!("{}_links.csv", stem));
    ensure_parent(&nodes_path)?;

    let mut w = csv::Writer::from_path(&nodes_path)?;
    w.write_record(["id", "x", "y", "label", "icon", "color", "description", "tags", "linked_note_id"])?;
    for n in store.nodes.values() {
        let tags = n.tags.iter().cloned().collect::<Vec<_>>().join(";");
        w.write_record([
            n.id.to_string(),
            n.x.to_string(),
            n.y.to_string(),
            n.label.clone(),
            n.icon.clone(),
            n.color.clone(),
            n.description.clone(),
            tags,
            n.linked_note_id.clone().unwrap_or_default(),
        ])?;
    }
    w.flush()?;

    let mut w = csv::Writer::from_path(&links_path)?;
    w.write_record(["id", "source", "target", "style"])?;
    for l in store.links.values() {
        let style = match l.style {
            LinkStyle::Solid => "solid",
            LinkStyle::Dashed => "dashed",
        };
        w.write_record([l.id.to_string(), l.source.to_string(), l.target.to_string(), style.to_string()])?;
    }
    w.flush()?;
    log::info!("exported galaxy csv to {} and {}", nodes_path.display(), links_path.display());
    Ok((nodes_path, links_path))
}

/// Read a JSON array of notes to turn into nodes.
pub fn load_note_seeds(path: &Path) -> anyhow::Result<Vec<NoteSeed>> {
    let mut f = File::open(path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    let notes: Vec<NoteSeed> = serde_json::from_str(&s)?;
    Ok(notes)
}
