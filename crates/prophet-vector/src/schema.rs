use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// One LanceDB table per logical index: record id plus its vector.
pub fn build_index_schema(dimension: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension), true),
	]))
}

/// Vector width of an index table, if the schema has a fixed-size vector column.
pub fn vector_dimension(schema: &Schema) -> Option<i32> {
	match schema.field_with_name("vector").ok()?.data_type() {
		DataType::FixedSizeList(_, n) => Some(*n),
		_ => None,
	}
}
