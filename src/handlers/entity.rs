//! Table CRUD handlers: list tables, select all, create, update, delete.

use crate::error::CrudError;
use crate::response::{success_many, success_rows};
use crate::schema;
use crate::service::{CrudOutcome, CrudRequest, RawField};
use crate::state::AppState;
use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Form,
};

/// Keep only form fields that name a declared column of `table`, in submitted order.
/// Unknown tables pass through untouched so the engine reports them.
fn form_to_fields(table: &str, form: Vec<(String, String)>) -> Vec<RawField> {
    let declared = schema::resolve(table);
    form.into_iter()
        .filter(|(k, _)| declared.map_or(true, |t| t.column(k).is_some()))
        .map(|(k, v)| RawField::new(k, v))
        .collect()
}

type FormBody = Result<Form<Vec<(String, String)>>, FormRejection>;

/// Unwrap the urlencoded body. An unreadable body on an unknown table reports the table.
fn form_fields(table: &str, form: FormBody) -> Result<Vec<RawField>, CrudError> {
    match form {
        Ok(Form(form)) => Ok(form_to_fields(table, form)),
        Err(rejection) => match schema::resolve(table) {
            None => Err(CrudError::UnknownTable(table.to_string())),
            Some(_) => Err(CrudError::InvalidBody(rejection.body_text())),
        },
    }
}

pub async fn list_tables() -> impl IntoResponse {
    success_many(schema::table_names())
}

pub async fn select_all(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<impl IntoResponse, CrudError> {
    match state.service.execute(&CrudRequest::select_all(table)).await? {
        CrudOutcome::Rows(rows) => Ok(success_rows(rows.columns, rows.rows)),
        CrudOutcome::Done => Ok(success_rows(Vec::new(), Vec::new())),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Path(table): Path<String>,
    form: FormBody,
) -> Result<impl IntoResponse, CrudError> {
    let fields = form_fields(&table, form)?;
    state.service.execute(&CrudRequest::insert(table, fields)).await?;
    Ok(StatusCode::CREATED)
}

pub async fn update(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    form: FormBody,
) -> Result<impl IntoResponse, CrudError> {
    let fields = form_fields(&table, form)?;
    state.service.execute(&CrudRequest::update(table, id, fields)).await?;
    Ok(StatusCode::OK)
}

pub async fn delete(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, CrudError> {
    state.service.execute(&CrudRequest::delete(table, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
