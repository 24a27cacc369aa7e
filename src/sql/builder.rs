//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a table descriptor.

use crate::error::CrudError;
use crate::schema::{ColumnSpec, IdKind, TableDescriptor};
use crate::sql::PgBindValue;

/// CRUD operation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Insert,
    SelectAll,
    UpdateById,
    DeleteById,
}

/// A validated column value. The column always comes from the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldValue {
    pub column: &'static ColumnSpec,
    pub value: PgBindValue,
}

/// Quote identifier for PostgreSQL (safe: only from the registry).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Placeholder for a column value, cast to the column's type.
    fn push_column_value(&mut self, field: &FieldValue) -> String {
        let param_num = self.push_param(field.value.clone());
        field
            .column
            .field
            .map(|f| format!("${}::{}", param_num, f.pg_type()))
            .unwrap_or_else(|| format!("${}", param_num))
    }

    /// `"key" = $n` for integer keys, `"key" = $n::uuid` for opaque ones.
    fn push_key_condition(&mut self, table: &TableDescriptor, key: &str, id: &PgBindValue) -> String {
        let param_num = self.push_param(id.clone());
        match table.id_kind {
            IdKind::SurrogateInteger => format!("{} = ${}", quoted(key), param_num),
            IdKind::OpaqueIdentifier => format!("{} = ${}::uuid", quoted(key), param_num),
        }
    }
}

/// Build the statement for one request.
pub fn build(
    table: &TableDescriptor,
    operation: Operation,
    fields: &[FieldValue],
    target_id: Option<&PgBindValue>,
) -> Result<QueryBuf, CrudError> {
    match operation {
        Operation::Insert => insert(table, fields),
        Operation::SelectAll => Ok(select_all(table)),
        Operation::UpdateById => update(table, target_id, fields),
        Operation::DeleteById => delete(table, target_id),
    }
}

/// SELECT every declared column; no filtering, no paging.
pub fn select_all(table: &TableDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols = table.column_names().map(quoted).collect::<Vec<_>>().join(", ");
    q.sql = format!("SELECT {} FROM {}", cols, quoted(table.name));
    q
}

/// INSERT: present fields in supplied order. Opaque-key tables get the key generated by the store.
pub fn insert(table: &TableDescriptor, fields: &[FieldValue]) -> Result<QueryBuf, CrudError> {
    if fields.is_empty() {
        return Err(CrudError::UnsupportedOperation(format!(
            "insert into {} requires at least one field",
            table.name
        )));
    }
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(fields.len() + 1);
    let mut placeholders = Vec::with_capacity(fields.len() + 1);
    if let (IdKind::OpaqueIdentifier, Some(key)) = (table.id_kind, table.key_column) {
        cols.push(quoted(key));
        placeholders.push("gen_random_uuid()".to_string());
    }
    for f in fields {
        cols.push(quoted(f.column.name));
        placeholders.push(q.push_column_value(f));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(table.name),
        cols.join(", "),
        placeholders.join(", ")
    );
    Ok(q)
}

/// UPDATE by id: SET exactly the present fields.
pub fn update(
    table: &TableDescriptor,
    target_id: Option<&PgBindValue>,
    fields: &[FieldValue],
) -> Result<QueryBuf, CrudError> {
    let (key, id) = key_and_target(table, target_id, "update")?;
    if fields.is_empty() {
        return Err(CrudError::NoFieldsToUpdate);
    }
    let mut q = QueryBuf::new();
    let sets = fields
        .iter()
        .map(|f| format!("{} = {}", quoted(f.column.name), q.push_column_value(f)))
        .collect::<Vec<_>>();
    let condition = q.push_key_condition(table, key, id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quoted(table.name),
        sets.join(", "),
        condition
    );
    Ok(q)
}

/// DELETE by id.
pub fn delete(table: &TableDescriptor, target_id: Option<&PgBindValue>) -> Result<QueryBuf, CrudError> {
    let (key, id) = key_and_target(table, target_id, "delete")?;
    let mut q = QueryBuf::new();
    let condition = q.push_key_condition(table, key, id);
    q.sql = format!("DELETE FROM {} WHERE {}", quoted(table.name), condition);
    Ok(q)
}

fn key_and_target<'a>(
    table: &TableDescriptor,
    target_id: Option<&'a PgBindValue>,
    op: &str,
) -> Result<(&'static str, &'a PgBindValue), CrudError> {
    let key = table.key_column.ok_or_else(|| {
        CrudError::UnsupportedOperation(format!("{} by id: {} has no single-column key", op, table.name))
    })?;
    let id = match target_id {
        None | Some(PgBindValue::Null) => {
            return Err(CrudError::UnsupportedOperation(format!("{} by id requires an id", op)))
        }
        Some(id) => id,
    };
    Ok((key, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolve;

    fn field(table: &str, column: &str, value: PgBindValue) -> FieldValue {
        FieldValue {
            column: resolve(table).unwrap().column(column).unwrap(),
            value,
        }
    }

    #[test]
    fn insert_lists_only_present_fields() {
        let books = resolve("books").unwrap();
        let q = insert(books, &[field("books", "title", PgBindValue::String("X".into()))]).unwrap();
        assert_eq!(
            q.sql,
            r#"INSERT INTO "books" ("id", "title") VALUES (gen_random_uuid(), $1::text)"#
        );
        assert_eq!(q.params, vec![PgBindValue::String("X".into())]);
    }

    #[test]
    fn insert_keeps_supplied_order() {
        let authors = resolve("authors").unwrap();
        let q = insert(
            authors,
            &[
                field("authors", "name", PgBindValue::String("Alexander".into())),
                field("authors", "surname", PgBindValue::String("Pushkin".into())),
            ],
        )
        .unwrap();
        assert_eq!(
            q.sql,
            r#"INSERT INTO "authors" ("id", "name", "surname") VALUES (gen_random_uuid(), $1::text, $2::text)"#
        );
    }

    #[test]
    fn insert_into_integer_keyed_table_takes_key_from_input() {
        let genres = resolve("genres").unwrap();
        let q = insert(
            genres,
            &[
                field("genres", "id", PgBindValue::I64(3)),
                field("genres", "name", PgBindValue::String("Poetry".into())),
            ],
        )
        .unwrap();
        assert_eq!(q.sql, r#"INSERT INTO "genres" ("id", "name") VALUES ($1::integer, $2::text)"#);
    }

    #[test]
    fn insert_link_table_has_no_generated_key() {
        let links = resolve("book_authors").unwrap();
        let id = uuid::Uuid::nil();
        let q = insert(
            links,
            &[
                field("book_authors", "book_id", PgBindValue::Uuid(id)),
                field("book_authors", "author_id", PgBindValue::Uuid(id)),
            ],
        )
        .unwrap();
        assert_eq!(
            q.sql,
            r#"INSERT INTO "book_authors" ("book_id", "author_id") VALUES ($1::uuid, $2::uuid)"#
        );
    }

    #[test]
    fn insert_without_fields_is_unsupported() {
        let err = insert(resolve("books").unwrap(), &[]).unwrap_err();
        assert!(matches!(err, CrudError::UnsupportedOperation(_)));
    }

    #[test]
    fn select_all_has_no_where_clause() {
        let q = select_all(resolve("genres").unwrap());
        assert_eq!(q.sql, r#"SELECT "id", "name" FROM "genres""#);
        assert!(q.params.is_empty());
    }

    #[test]
    fn update_integer_key_compares_directly() {
        let genres = resolve("genres").unwrap();
        let q = update(
            genres,
            Some(&PgBindValue::I64(3)),
            &[field("genres", "name", PgBindValue::String("Drama".into()))],
        )
        .unwrap();
        assert_eq!(q.sql, r#"UPDATE "genres" SET "name" = $1::text WHERE "id" = $2"#);
        assert_eq!(q.params[1], PgBindValue::I64(3));
    }

    #[test]
    fn update_opaque_key_casts_to_uuid() {
        let books = resolve("books").unwrap();
        let id = uuid::Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let q = update(
            books,
            Some(&PgBindValue::Uuid(id)),
            &[field("books", "popularity_score", PgBindValue::I64(9))],
        )
        .unwrap();
        assert_eq!(
            q.sql,
            r#"UPDATE "books" SET "popularity_score" = $1::integer WHERE "id" = $2::uuid"#
        );
    }

    #[test]
    fn update_without_fields_fails() {
        let err = update(resolve("genres").unwrap(), Some(&PgBindValue::I64(3)), &[]).unwrap_err();
        assert!(matches!(err, CrudError::NoFieldsToUpdate));
    }

    #[test]
    fn delete_always_has_key_condition() {
        let q = delete(resolve("authors").unwrap(), Some(&PgBindValue::Uuid(uuid::Uuid::nil()))).unwrap();
        assert_eq!(q.sql, r#"DELETE FROM "authors" WHERE "id" = $1::uuid"#);
        let err = delete(resolve("authors").unwrap(), None).unwrap_err();
        assert!(matches!(err, CrudError::UnsupportedOperation(_)));
        let err = delete(resolve("authors").unwrap(), Some(&PgBindValue::Null)).unwrap_err();
        assert!(matches!(err, CrudError::UnsupportedOperation(_)));
    }

    #[test]
    fn link_table_cannot_be_addressed_by_id() {
        let err = delete(resolve("book_authors").unwrap(), Some(&PgBindValue::Uuid(uuid::Uuid::nil()))).unwrap_err();
        assert!(matches!(err, CrudError::UnsupportedOperation(_)));
    }

    #[test]
    fn build_dispatches_by_operation() {
        let genres = resolve("genres").unwrap();
        let q = build(genres, Operation::DeleteById, &[], Some(&PgBindValue::I64(1))).unwrap();
        assert_eq!(q.sql, r#"DELETE FROM "genres" WHERE "id" = $1"#);
        let q = build(genres, Operation::SelectAll, &[], None).unwrap();
        assert!(q.sql.starts_with("SELECT"));
    }
}
