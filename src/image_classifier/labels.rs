use crate::error::ModelLoadError;
use std::path::Path;

/// Reads class names, one per line. Blank lines are skipped and a leading
/// WordNet id such as `n01440764 ` is dropped.
pub fn load_labels(path: &Path) -> Result<Vec<String>, ModelLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Labels {
        path: path.to_path_buf(),
        source,
    })?;

    let labels = parse_labels(&contents);

    if labels.is_empty() {
        return Err(ModelLoadError::EmptyLabels(path.to_path_buf()));
    }

    Ok(labels)
}

pub fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_wordnet_id(line).to_string())
        .collect()
}

fn strip_wordnet_id(line: &str) -> &str {
    match line.split_once(' ') {
        Some((id, rest)) if is_wordnet_id(id) => rest.trim_start(),
        _ => line,
    }
}

fn is_wordnet_id(token: &str) -> bool {
    token.len() == 9
        && token.starts_with('n')
        && token[1..].chars().all(|c| c.is_ascii_digit())
}

/// Name used for a class when no labels file is configured.
pub fn fallback_label(class_index: usize) -> String {
    format!("class_{}", class_index)
}
