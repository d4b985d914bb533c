use super::dot::GraphDescription;
use crate::config::LayoutConfig;
use crate::error::{ViewError, ViewResult};
use crate::ir::{CoreData, GraphLayout};
use std::path::Path;

pub fn read_plain_layout(path: &Path) -> ViewResult<String> {
    let contents = std::fs::read_to_string(path).map_err(|_| ViewError::FileRead {
        path: path.to_path_buf(),
    })?;
    if contents.is_empty() {
        return Err(ViewError::FileRead {
            path: path.to_path_buf(),
        });
    }
    Ok(contents)
}

fn number(field: &str, line: &str) -> ViewResult<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ViewError::InvalidLayoutFormat(line.to_string()))
}

fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(field)
}

/// View id for a node named in the plain output.
///
/// A literal view id wins; only ids that are not in the view go through the escape aliases.
fn view_id<'a>(data: &CoreData, description: &'a GraphDescription, raw: &'a str) -> &'a str {
    let raw = unquote(raw);
    if data.find_node(raw).is_some() {
        raw
    } else {
        description.resolve(raw)
    }
}

/// Applies Graphviz `-Tplain` output to `data`: positions, text boxes, edges and map geometry.
///
/// Ids not found in the view are mapped back through `description` when escaping changed
/// them. Nodes absent from the view are ignored and the scan ends at `stop`.
pub fn apply_plain_layout(
    data: &mut CoreData,
    plain: &str,
    layout: GraphLayout,
    config: &LayoutConfig,
    description: &GraphDescription,
) -> ViewResult<()> {
    let mut lines = plain.lines();
    let header = lines.next().ok_or_else(|| ViewError::FileRead {
        path: "<plain>".into(),
    })?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() != 4 || fields[0] != "graph" {
        return Err(ViewError::InvalidLayoutFormat(header.to_string()));
    }

    let scale = config.scale(layout);
    data.graph_layout = layout;
    data.map_width = number(fields[2], header)? * scale.x;
    data.map_height = number(fields[3], header)? * scale.y;
    data.min_x = 0.0;
    data.min_y = 0.0;
    let mut max_text_w: f64 = 0.0;
    let mut max_text_h: f64 = 0.0;

    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.first().copied() {
            Some("node") => {
                if fields.len() < 6 {
                    return Err(ViewError::InvalidLayoutFormat(line.to_string()));
                }
                let x = number(fields[2], line)? * scale.x;
                let y = number(fields[3], line)? * scale.y;
                let text_w = number(fields[4], line)? * scale.x;
                let text_h = number(fields[5], line)? * scale.y;
                let id = view_id(data, description, fields[1]);
                let Some(node) = data.find_node_mut(id) else {
                    tracing::debug!(id, "layout node not in view");
                    continue;
                };
                node.pos_x = x;
                node.pos_y = y;
                node.text_w = text_w;
                node.text_h = text_h;
                data.min_x = data.min_x.min(x);
                data.min_y = data.min_y.min(y);
                max_text_w = max_text_w.max(text_w);
                max_text_h = max_text_h.max(text_h);
            }
            Some("edge") => {
                if fields.len() < 3 {
                    return Err(ViewError::InvalidLayoutFormat(line.to_string()));
                }
                let parent = view_id(data, description, fields[1]).to_string();
                let child = view_id(data, description, fields[2]).to_string();
                data.edges.push((parent, child));
            }
            Some("stop") => break,
            _ => {}
        }
    }

    match layout {
        GraphLayout::Neato => {
            data.min_x -= max_text_w * config.neato_anchor_ratio;
            data.min_y -= max_text_h * config.neato_anchor_ratio;
        }
        GraphLayout::Dot => {}
    }

    data.min_x = data.min_x.abs() + config.border_width;
    data.min_y = data.min_y.abs() + config.border_height;
    data.map_width += data.min_x;
    data.map_height += data.min_y;
    Ok(())
}

pub fn apply_plain_layout_file(
    data: &mut CoreData,
    path: &Path,
    layout: GraphLayout,
    config: &LayoutConfig,
    description: &GraphDescription,
) -> ViewResult<()> {
    let contents = read_plain_layout(path)?;
    apply_plain_layout(data, &contents, layout, config, description)
}
