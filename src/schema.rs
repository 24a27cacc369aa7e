//! Table schema registry: the fixed set of tables the catalog manages.
//! Identifiers used in SQL come only from here.

use crate::service::FieldSpec;

/// How a table's primary key is represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdKind {
    /// Application-assigned sequential integer.
    SurrogateInteger,
    /// Store-generated UUID.
    OpaqueIdentifier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    /// None for columns the store fills in (generated ids, timestamps).
    pub field: Option<FieldSpec<'static>>,
}

impl ColumnSpec {
    const fn writable(name: &'static str, field: FieldSpec<'static>) -> Self {
        ColumnSpec { name, field: Some(field) }
    }

    const fn read_only(name: &'static str) -> Self {
        ColumnSpec { name, field: None }
    }

    pub fn is_writable(&self) -> bool {
        self.field.is_some()
    }
}

#[derive(Debug)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
    pub id_kind: IdKind,
    /// Single-column primary key addressed by update/delete. None for link tables.
    pub key_column: Option<&'static str>,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn writable_columns(&self) -> impl Iterator<Item = &'static ColumnSpec> + '_ {
        self.columns.iter().filter(|c| c.is_writable())
    }

    /// Spec used to validate an id addressed by update/delete.
    pub fn key_spec(&self) -> FieldSpec<'static> {
        match self.id_kind {
            IdKind::SurrogateInteger => FieldSpec::integer(1, i64::MAX),
            IdKind::OpaqueIdentifier => FieldSpec::uuid(),
        }
    }
}

const AUTHORS: &[ColumnSpec] = &[
    ColumnSpec::read_only("id"),
    ColumnSpec::writable("surname", FieldSpec::text()),
    ColumnSpec::writable("name", FieldSpec::text()),
    ColumnSpec::writable("patronymic", FieldSpec::text().optional()),
    ColumnSpec::writable("birth_date", FieldSpec::date()),
    ColumnSpec::writable("biography", FieldSpec::text()),
];

const BOOKS: &[ColumnSpec] = &[
    ColumnSpec::read_only("id"),
    ColumnSpec::writable("title", FieldSpec::text()),
    ColumnSpec::writable("description", FieldSpec::text()),
    ColumnSpec::writable("genre_id", FieldSpec::integer(1, i64::MAX)),
    ColumnSpec::writable("is_available", FieldSpec::boolean()),
    ColumnSpec::writable("publication_date", FieldSpec::date()),
    ColumnSpec::writable("popularity_score", FieldSpec::integer(1, 10)),
    ColumnSpec::read_only("created_at"),
];

const GENRES: &[ColumnSpec] = &[
    ColumnSpec::writable("id", FieldSpec::integer(1, i64::MAX)),
    ColumnSpec::writable("name", FieldSpec::text()),
];

const BOOK_AUTHORS: &[ColumnSpec] = &[
    ColumnSpec::writable("book_id", FieldSpec::uuid()),
    ColumnSpec::writable("author_id", FieldSpec::uuid()),
];

static TABLES: [TableDescriptor; 4] = [
    TableDescriptor {
        name: "authors",
        columns: AUTHORS,
        id_kind: IdKind::OpaqueIdentifier,
        key_column: Some("id"),
    },
    TableDescriptor {
        name: "books",
        columns: BOOKS,
        id_kind: IdKind::OpaqueIdentifier,
        key_column: Some("id"),
    },
    TableDescriptor {
        name: "genres",
        columns: GENRES,
        id_kind: IdKind::SurrogateInteger,
        key_column: Some("id"),
    },
    TableDescriptor {
        name: "book_authors",
        columns: BOOK_AUTHORS,
        id_kind: IdKind::OpaqueIdentifier,
        key_column: None,
    },
];

/// Exact, case-sensitive lookup.
pub fn resolve(name: &str) -> Option<&'static TableDescriptor> {
    TABLES.iter().find(|t| t.name == name)
}

pub fn tables() -> &'static [TableDescriptor] {
    &TABLES
}

pub fn table_names() -> Vec<&'static str> {
    TABLES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_names_only() {
        assert_eq!(resolve("books").map(|t| t.name), Some("books"));
        assert!(resolve("Books").is_none());
        assert!(resolve("books; DROP TABLE books").is_none());
        assert!(resolve("").is_none());
    }

    #[test]
    fn names_in_menu_order() {
        assert_eq!(table_names(), vec!["authors", "books", "genres", "book_authors"]);
    }

    #[test]
    fn only_genres_use_integer_keys() {
        for t in tables() {
            let expected = if t.name == "genres" {
                IdKind::SurrogateInteger
            } else {
                IdKind::OpaqueIdentifier
            };
            assert_eq!(t.id_kind, expected, "{}", t.name);
        }
    }

    #[test]
    fn generated_columns_are_read_only() {
        let books = resolve("books").unwrap();
        assert!(!books.column("id").unwrap().is_writable());
        assert!(!books.column("created_at").unwrap().is_writable());
        assert!(resolve("genres").unwrap().column("id").unwrap().is_writable());
        assert_eq!(
            resolve("authors").unwrap().column("patronymic").unwrap().field.map(|f| f.required),
            Some(false)
        );
    }

    #[test]
    fn identifiers_are_plain_snake_case() {
        for t in tables() {
            for name in std::iter::once(t.name).chain(t.column_names()) {
                assert!(
                    name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                    "{}",
                    name
                );
            }
        }
    }
}
