// src/utils/naming.rs: Output naming convention shared by every driver

use crate::config::defs::PipelineError;


/// Pieces of an object path's final segment used by naming templates.
#[derive(Debug, Clone, PartialEq)]
pub struct NameParts<'a> {
    pub name: &'a str,
    pub stem: &'a str,
    pub base: &'a str,
    pub ext: &'a str,
}

/// Splits the final `/` segment of a path into its naming parts.
///
/// # Arguments
///
/// * `path` - Local path or cloud object path (`gs://bucket/dir/x.bam`).
///
/// # Returns
/// NameParts: `name` full segment, `stem` text before the first dot,
/// `base` text before the last dot, `ext` text after the last dot.
pub fn name_parts(path: &str) -> NameParts<'_> {
    let name = path.trim().rsplit('/').next().unwrap_or("");
    let stem = name.split('.').next().unwrap_or("");
    let (base, ext) = match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (name, ""),
    };
    NameParts { name, stem, base, ext }
}

/// Sample name of a path: the final segment up to its first dot.
pub fn sample_stem(path: &str) -> &str {
    name_parts(path).stem
}

/// Parent "directory" of a path, or an empty string when there is none.
/// A `scheme://bucket` root is its own parent.
pub fn parent_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    let root = trimmed.find("://").map_or(0, |i| i + 3);
    match trimmed[root..].rfind('/') {
        Some(pos) => &trimmed[..root + pos],
        None if root > 0 => trimmed,
        None => "",
    }
}

/// Joins a prefix and a child segment with a single slash.
pub fn join_prefix(prefix: &str, child: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", prefix, child)
    }
}

/// Renders a naming template against an input path.
///
/// # Arguments
///
/// * `template` - Text with `{name}`, `{stem}`, `{base}` and `{ext}` placeholders.
/// * `input` - Path whose final segment fills the placeholders.
///
/// # Returns
/// The rendered name, or InvalidTemplate for unknown or unbalanced placeholders.
pub fn render_template(template: &str, input: &str) -> Result<String, PipelineError> {
    let parts = name_parts(input);
    let mut out = String::with_capacity(template.len() + parts.name.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| PipelineError::InvalidTemplate(format!("unclosed '{{' in {}", template)))?;
        let value = match &after[..close] {
            "name" => parts.name,
            "stem" => parts.stem,
            "base" => parts.base,
            "ext" => parts.ext,
            other => {
                return Err(PipelineError::InvalidTemplate(format!(
                    "unknown placeholder {{{}}} in {}",
                    other, template
                )));
            }
        };
        out.push_str(value);
        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err(PipelineError::InvalidTemplate(format!("unmatched '}}' in {}", template)));
    }
    out.push_str(rest);
    Ok(out)
}

/// Derives an output path: `<prefix>/<rendered template>`.
pub fn derive_output(input: &str, prefix: &str, template: &str) -> Result<String, PipelineError> {
    Ok(join_prefix(prefix, &render_template(template, input)?))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defs::{INDEX_TEMPLATE, STEM_TEMPLATE};

    #[test]
    fn test_name_parts() {
        let parts = name_parts("gs://b/x/sample1.sorted.bam");
        assert_eq!(parts.name, "sample1.sorted.bam");
        assert_eq!(parts.stem, "sample1");
        assert_eq!(parts.base, "sample1.sorted");
        assert_eq!(parts.ext, "bam");

        let bare = name_parts("sample2");
        assert_eq!(bare.stem, "sample2");
        assert_eq!(bare.base, "sample2");
        assert_eq!(bare.ext, "");
    }

    #[test]
    fn test_index_output_derivation() {
        let out = derive_output("gs://b/x/sample1.bam", "gs://out", INDEX_TEMPLATE).unwrap();
        assert_eq!(out, "gs://out/sample1.bam.bai");
    }

    #[test]
    fn test_stem_output_trims_trailing_slash() {
        let out = derive_output("gs://b/x/sample1.bam", "gs://out/", STEM_TEMPLATE).unwrap();
        assert_eq!(out, "gs://out/sample1");
    }

    #[test]
    fn test_base_ext_template() {
        let out = derive_output("gs://b/NA12878.chr20.bam", "gs://fixed", "{base}.head.{ext}").unwrap();
        assert_eq!(out, "gs://fixed/NA12878.chr20.head.bam");
    }

    #[test]
    fn test_bad_templates() {
        assert!(matches!(render_template("{nope}", "a.bam"), Err(PipelineError::InvalidTemplate(_))));
        assert!(matches!(render_template("{stem", "a.bam"), Err(PipelineError::InvalidTemplate(_))));
        assert!(matches!(render_template("stem}", "a.bam"), Err(PipelineError::InvalidTemplate(_))));
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("/data/lists/bams.txt"), "/data/lists");
        assert_eq!(parent_of("bams.txt"), "");
        assert_eq!(parent_of("gs://out/sample1.bam"), "gs://out");
        assert_eq!(parent_of("gs://bucket"), "gs://bucket");
        assert_eq!(parent_of("gs://bucket/"), "gs://bucket");
        assert_eq!(parent_of("gs://bucket/dir/"), "gs://bucket");
    }
}
