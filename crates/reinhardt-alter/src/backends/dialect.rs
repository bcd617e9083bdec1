//! SQL text generation through sea-query

use sea_query::{
	Alias, ColumnDef, Index, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder, Table,
	TableCreateStatement, Value,
};
use serde::{Deserialize, Serialize};

use super::SqlGenerator;
use crate::schema::{Field, FieldType, FieldValue, TableSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
	Sqlite,
	Postgres,
	Mysql,
}

/// [`SqlGenerator`] building DDL with sea-query
///
/// # Example
///
/// ```rust
/// use reinhardt_alter::backends::{SeaQueryGenerator, SqlDialect, SqlGenerator};
/// use reinhardt_alter::schema::{FieldType, FieldValue};
///
/// let generator = SeaQueryGenerator::new(SqlDialect::Sqlite);
/// assert_eq!(generator.escape_identifier("order"), "\"order\"");
/// assert_eq!(generator.value_to_sql(FieldType::Text, &FieldValue::from("it's")), "'it''s'");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeaQueryGenerator {
	dialect: SqlDialect,
}

impl SeaQueryGenerator {
	pub fn new(dialect: SqlDialect) -> Self {
		Self { dialect }
	}

	pub fn dialect(&self) -> SqlDialect {
		self.dialect
	}

	fn table_statement(&self, table: &TableSchema) -> TableCreateStatement {
		let primary_key = table.primary_key();
		let composite_key = primary_key.len() > 1;

		let mut stmt = Table::create();
		stmt.table(Alias::new(table.name.as_str()));
		for field in &table.fields {
			let mut column = column_def(field, !composite_key);
			stmt.col(&mut column);
		}
		if composite_key {
			let mut pk = Index::create();
			for name in primary_key {
				pk.col(Alias::new(name));
			}
			stmt.primary_key(&mut pk);
		}
		stmt
	}

	fn quote_text(&self, text: &str) -> String {
		let escaped = text.replace('\'', "''");
		match self.dialect {
			SqlDialect::Mysql => format!("'{}'", escaped.replace('\\', "\\\\")),
			SqlDialect::Sqlite | SqlDialect::Postgres => format!("'{}'", escaped),
		}
	}

	fn bool_literal(&self, value: bool) -> String {
		match (self.dialect, value) {
			(SqlDialect::Postgres, true) => "TRUE".to_string(),
			(SqlDialect::Postgres, false) => "FALSE".to_string(),
			(_, true) => "1".to_string(),
			(_, false) => "0".to_string(),
		}
	}

	fn bytes_literal(&self, bytes: &[u8]) -> String {
		let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
		match self.dialect {
			SqlDialect::Postgres => format!("'\\x{}'::bytea", hex),
			SqlDialect::Sqlite | SqlDialect::Mysql => format!("X'{}'", hex),
		}
	}

	fn literal(&self, value: &FieldValue) -> String {
		match value {
			FieldValue::Null => "NULL".to_string(),
			FieldValue::Bool(b) => self.bool_literal(*b),
			FieldValue::Int(i) => i.to_string(),
			FieldValue::Float(v) if v.is_finite() => format!("{:?}", v),
			FieldValue::Float(_) => "NULL".to_string(),
			FieldValue::Text(s) => self.quote_text(s),
			FieldValue::Bytes(b) => self.bytes_literal(b),
			FieldValue::Date(d) => self.quote_text(&d.format("%Y-%m-%d").to_string()),
			FieldValue::DateTime(dt) => self.quote_text(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
			FieldValue::Time(t) => self.quote_text(&t.format("%H:%M:%S").to_string()),
		}
	}
}

impl SqlGenerator for SeaQueryGenerator {
	fn escape_identifier(&self, identifier: &str) -> String {
		match self.dialect {
			SqlDialect::Mysql => format!("`{}`", identifier.replace('`', "``")),
			SqlDialect::Sqlite | SqlDialect::Postgres => format!("\"{}\"", identifier.replace('"', "\"\"")),
		}
	}

	fn value_to_sql(&self, field_type: FieldType, value: &FieldValue) -> String {
		if value.is_null() {
			return "NULL".to_string();
		}
		match field_type {
			FieldType::Boolean => match value.as_bool() {
				Some(b) => self.bool_literal(b),
				None => self.literal(value),
			},
			t if t.is_integer() => match value.as_int() {
				Some(i) => i.to_string(),
				None => self.literal(value),
			},
			t if t.is_text() => match value {
				FieldValue::Text(s) => self.quote_text(s),
				other => self.quote_text(&other.to_string()),
			},
			_ => self.literal(value),
		}
	}

	fn create_table_sql(&self, table: &TableSchema) -> String {
		let stmt = self.table_statement(table);
		match self.dialect {
			SqlDialect::Sqlite => stmt.to_string(SqliteQueryBuilder),
			SqlDialect::Postgres => stmt.to_string(PostgresQueryBuilder),
			SqlDialect::Mysql => stmt.to_string(MysqlQueryBuilder),
		}
	}

	fn create_index_sql(&self, table: &TableSchema) -> Vec<String> {
		table
			.effective_indexes()
			.iter()
			.map(|idx| {
				let mut stmt = Index::create();
				stmt.name(idx.name.as_str()).table(Alias::new(table.name.as_str()));
				for column in &idx.columns {
					stmt.col(Alias::new(column.as_str()));
				}
				if idx.unique {
					stmt.unique();
				}
				match self.dialect {
					SqlDialect::Sqlite => stmt.to_string(SqliteQueryBuilder),
					SqlDialect::Postgres => stmt.to_string(PostgresQueryBuilder),
					SqlDialect::Mysql => stmt.to_string(MysqlQueryBuilder),
				}
			})
			.collect()
	}
}

fn column_def(field: &Field, inline_primary_key: bool) -> ColumnDef {
	let mut column = ColumnDef::new(Alias::new(field.name.as_str()));
	match (field.field_type, field.unsigned) {
		(FieldType::Byte, false) => column.tiny_integer(),
		(FieldType::Byte, true) => column.tiny_unsigned(),
		(FieldType::ShortInteger, false) => column.small_integer(),
		(FieldType::ShortInteger, true) => column.small_unsigned(),
		(FieldType::Integer, false) => column.integer(),
		(FieldType::Integer, true) => column.unsigned(),
		(FieldType::BigInteger, false) => column.big_integer(),
		(FieldType::BigInteger, true) => column.big_unsigned(),
		(FieldType::Boolean, _) => column.boolean(),
		(FieldType::Date, _) => column.date(),
		(FieldType::DateTime, _) => column.date_time(),
		(FieldType::Time, _) => column.time(),
		(FieldType::Float | FieldType::Double, _) if field.precision.is_some() => {
			let scale = field
				.visible_decimal_places
				.and_then(|places| u32::try_from(places).ok())
				.unwrap_or(0);
			column.decimal_len(field.precision.unwrap_or_default(), scale)
		}
		(FieldType::Float, _) => column.float(),
		(FieldType::Double, _) => column.double(),
		(FieldType::Text, _) => match field.max_length {
			Some(len) => column.string_len(len),
			None => column.string(),
		},
		(FieldType::LongText, _) => column.text(),
		(FieldType::Blob, _) => column.blob(),
	};

	let c = &field.constraints;
	if c.not_null {
		column.not_null();
	}
	if c.primary_key && inline_primary_key {
		column.primary_key();
	}
	if c.auto_increment {
		column.auto_increment();
	}
	if c.unique && !c.primary_key {
		column.unique_key();
	}
	if let Some(default) = field.default_value.as_ref().and_then(sea_value) {
		column.default(default);
	}
	column
}

fn sea_value(value: &FieldValue) -> Option<Value> {
	let value = match value {
		FieldValue::Null => return None,
		FieldValue::Bool(b) => Value::from(*b),
		FieldValue::Int(i) => Value::from(*i),
		FieldValue::Float(v) => Value::from(*v),
		FieldValue::Text(s) => Value::from(s.clone()),
		FieldValue::Bytes(b) => Value::from(b.clone()),
		FieldValue::Date(d) => Value::from(*d),
		FieldValue::DateTime(dt) => Value::from(*dt),
		FieldValue::Time(t) => Value::from(*t),
	};
	Some(value)
}
