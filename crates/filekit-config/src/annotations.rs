//! Turns `///` docs on config structs into comments in the generated TOML.

use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{ArrayOfTables, Decor, Item, RawString, Table};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Prepends `docs` to `decor`, one `#` comment per line.
///
/// An existing prefix is kept. When it does not already end on an empty line, a bare `#`
/// line separates it from the new comments.
pub fn append_docs_as_toml_comments(decor: &mut Decor, docs: &str) {
    let old_prefix = decor.prefix().and_then(RawString::as_str).unwrap_or("");

    let comments: String = docs
        .lines()
        .map(|line| {
            if line.is_empty() {
                "#\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect();

    let new_prefix = match old_prefix.lines().last() {
        None => format!("{old_prefix}{comments}"),
        Some("") => format!("{old_prefix}{comments}"),
        Some(_) => format!("{old_prefix}#\n{comments}"),
    };
    decor.set_prefix(new_prefix);
}

/// Adds the field docs of `T` above each matching key of `table`.
///
/// Nested tables also receive the struct-level docs of `T` unless `is_root` is set. Keys
/// without field docs are left alone and reported at `warn` level.
pub fn annotate_toml_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        append_docs_as_toml_comments(table.decor_mut(), T::DOCS);
    }

    for (mut key, item) in table.iter_mut() {
        let name = key.get().to_string();
        let Ok(docs) = T::get_field_docs(&name) else {
            warn!(
                "Field '{}' has no documentation on '{}'",
                name,
                type_name::<T>()
            );
            continue;
        };

        match item {
            Item::None => return Err(ConfigError::UnexpectedTomlItem(name)),
            Item::Value(_) => append_docs_as_toml_comments(key.leaf_decor_mut(), docs),
            Item::Table(sub_table) => append_docs_as_toml_comments(sub_table.decor_mut(), docs),
            Item::ArrayOfTables(array) => {
                let first = array
                    .iter_mut()
                    .next()
                    .ok_or_else(|| ConfigError::UnexpectedTomlItem(name.clone()))?;
                append_docs_as_toml_comments(first.decor_mut(), docs);
            }
        }
    }

    Ok(())
}

/// Annotates the first table of `array` with the docs of `T`; the rest share its shape.
pub fn annotate_toml_array_of_tables<T>(array: &mut ArrayOfTables) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if let Some(first) = array.iter_mut().next() {
        annotate_toml_table::<T>(first, false)
            .map_err(|err| ConfigError::AnnotateFirstTable(err.to_string()))?;
    }
    Ok(())
}
