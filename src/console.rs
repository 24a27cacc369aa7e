//! Interactive console menu over the CRUD engine.
//!
//! Runs as a blocking loop on its own thread; engine calls are driven through a tokio
//! runtime handle. Input is re-prompted until it passes field validation. End of input
//! exits the menu.

use crate::schema::{self, TableDescriptor};
use crate::service::{validate, Coerced, CrudOutcome, CrudRequest, CrudService, FieldSpec, RawField};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::runtime::Handle;

/// `None` means input ended.
type Step<T> = io::Result<Option<T>>;

pub struct Console<R, W> {
    service: Arc<CrudService>,
    runtime: Handle,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(service: Arc<CrudService>, runtime: Handle, input: R, output: W) -> Self {
        Console {
            service,
            runtime,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "Bookstore catalog")?;
            writeln!(self.output, "1. View records")?;
            writeln!(self.output, "2. Add record")?;
            writeln!(self.output, "3. Edit record")?;
            writeln!(self.output, "4. Delete record")?;
            writeln!(self.output, "5. Exit")?;
            let Some(choice) = self.prompt_number("Select action", 1, 5)? else {
                return Ok(());
            };
            let step = match choice {
                1 => self.show()?,
                2 => self.add()?,
                3 => self.edit()?,
                4 => self.remove()?,
                _ => return Ok(()),
            };
            if step.is_none() {
                return Ok(());
            }
        }
    }

    fn show(&mut self) -> Step<()> {
        let Some(table) = self.choose_table()? else { return Ok(None) };
        match self.execute(CrudRequest::select_all(table.name)) {
            Ok(CrudOutcome::Rows(rows)) => {
                writeln!(self.output, "Records in {} ({}):", table.name, rows.len())?;
                writeln!(self.output, "{}", rows.columns.join(" | "))?;
                for row in &rows.rows {
                    let cells: Vec<String> = row.iter().map(render_cell).collect();
                    writeln!(self.output, "{}", cells.join(" | "))?;
                }
            }
            Ok(CrudOutcome::Done) => {}
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Some(()))
    }

    fn add(&mut self) -> Step<()> {
        let Some(table) = self.choose_table()? else { return Ok(None) };
        writeln!(self.output, "New record in {}", table.name)?;
        let mut fields = Vec::new();
        for column in table.writable_columns() {
            let Some(spec) = column.field else { continue };
            let Some((raw, value)) = self.prompt_field(column.name, &spec)? else {
                return Ok(None);
            };
            if value != Coerced::Absent {
                fields.push(RawField::new(column.name, raw));
            }
        }
        match self.execute(CrudRequest::insert(table.name, fields)) {
            Ok(_) => writeln!(self.output, "Record added")?,
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Some(()))
    }

    fn edit(&mut self) -> Step<()> {
        let Some(table) = self.choose_table()? else { return Ok(None) };
        if table.key_column.is_none() {
            writeln!(self.output, "Records in {} cannot be addressed by id", table.name)?;
            return Ok(Some(()));
        }
        let Some((id, _)) = self.prompt_field("id", &table.key_spec())? else {
            return Ok(None);
        };
        let names: Vec<&str> = table.writable_columns().map(|c| c.name).collect();
        let Some((_, Coerced::Text(name))) = self.prompt_field("field to update", &FieldSpec::choice(&names))? else {
            return Ok(None);
        };
        let Some(spec) = table.column(&name).and_then(|c| c.field) else {
            return Ok(Some(()));
        };
        let Some((raw, _)) = self.prompt_field(&format!("new value for {}", name), &spec)? else {
            return Ok(None);
        };
        match self.execute(CrudRequest::update(table.name, id, vec![RawField::new(name, raw)])) {
            Ok(_) => writeln!(self.output, "Record updated")?,
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Some(()))
    }

    fn remove(&mut self) -> Step<()> {
        let Some(table) = self.choose_table()? else { return Ok(None) };
        if table.key_column.is_none() {
            writeln!(self.output, "Records in {} cannot be addressed by id", table.name)?;
            return Ok(Some(()));
        }
        let Some((id, _)) = self.prompt_field("id", &table.key_spec())? else {
            return Ok(None);
        };
        match self.execute(CrudRequest::delete(table.name, id)) {
            Ok(_) => writeln!(self.output, "Record deleted")?,
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Some(()))
    }

    fn choose_table(&mut self) -> Step<&'static TableDescriptor> {
        let tables = schema::tables();
        writeln!(self.output, "Tables:")?;
        for (i, t) in tables.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, t.name)?;
        }
        let Some(n) = self.prompt_number("Select table", 1, tables.len() as i64)? else {
            return Ok(None);
        };
        Ok(tables.get((n - 1) as usize))
    }

    fn prompt_number(&mut self, label: &str, min: i64, max: i64) -> Step<i64> {
        match self.prompt_field(label, &FieldSpec::integer(min, max))? {
            Some((_, Coerced::Integer(n))) => Ok(Some(n)),
            _ => Ok(None),
        }
    }

    /// Prompt until the input validates. Returns the trimmed raw text with its coerced value.
    fn prompt_field(&mut self, label: &str, spec: &FieldSpec<'_>) -> Step<(String, Coerced)> {
        let hint = spec.hint();
        let optional = if spec.required { "" } else { " (optional)" };
        loop {
            if hint.is_empty() {
                write!(self.output, "{}{}: ", label, optional)?;
            } else {
                write!(self.output, "{} {}{}: ", label, hint, optional)?;
            }
            self.output.flush()?;
            let mut raw = Vec::new();
            if self.input.read_until(b'\n', &mut raw)? == 0 {
                return Ok(None);
            }
            // Undecodable bytes become U+FFFD and fail validation like any other bad entry.
            let line = String::from_utf8_lossy(&raw);
            match validate(&line, spec) {
                Ok(value) => return Ok(Some((line.trim().to_string(), value))),
                Err(message) => writeln!(self.output, "Invalid {}: {}", label, message)?,
            }
        }
    }

    fn execute(&self, request: CrudRequest) -> Result<CrudOutcome, crate::error::CrudError> {
        self.runtime.block_on(self.service.execute(&request))
    }
}

fn render_cell(v: &Value) -> String {
    match v {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
