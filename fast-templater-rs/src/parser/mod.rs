//! Parsers for Markdown documents.

pub mod frontmatter;

pub use frontmatter::{
    extract_frontmatter, parse_frontmatter, render_frontmatter_block, serialize_frontmatter,
    splice_frontmatter, split_frontmatter, update_frontmatter,
};
