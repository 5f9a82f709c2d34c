//! Parquet reader built on the Arrow record batch API.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{LoadError, LoadResult};
use crate::models::{CellValue, Column, RecordSet};

fn arrow_error(e: ArrowError) -> LoadError {
    LoadError::Parquet(e.to_string())
}

/// Read a whole parquet file into memory.
pub fn read_parquet(path: &Path) -> LoadResult<RecordSet> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| LoadError::Parquet(e.to_string()))?;

    let mut columns: Vec<Column> = builder
        .schema()
        .fields()
        .iter()
        .map(|field| Column::new(field.name().clone(), Vec::new()))
        .collect();

    let reader = builder.build().map_err(|e| LoadError::Parquet(e.to_string()))?;
    for batch in reader {
        let batch = batch.map_err(arrow_error)?;
        for (column, array) in columns.iter_mut().zip(batch.columns()) {
            append_array(&mut column.values, array)?;
        }
    }

    Ok(RecordSet::new(columns))
}

/// Convert one Arrow array into cells and append them.
fn append_array(out: &mut Vec<CellValue>, array: &ArrayRef) -> LoadResult<()> {
    out.reserve(array.len());

    match array.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let ints = cast(array, &DataType::Int64).map_err(arrow_error)?;
            let ints = ints.as_primitive::<Int64Type>();
            out.extend((0..ints.len()).map(|i| {
                if ints.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Int(ints.value(i))
                }
            }));
        }
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => {
            let floats = cast(array, &DataType::Float64).map_err(arrow_error)?;
            let floats = floats.as_primitive::<Float64Type>();
            out.extend((0..floats.len()).map(|i| {
                if floats.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Float(floats.value(i))
                }
            }));
        }
        DataType::Boolean => {
            let bools = array.as_boolean();
            out.extend((0..bools.len()).map(|i| {
                if bools.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Bool(bools.value(i))
                }
            }));
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => append_strings(out, array)?,
        DataType::Dictionary(_, values) if matches!(values.as_ref(), DataType::Utf8 | DataType::LargeUtf8) => {
            append_strings(out, array)?
        }
        // Dates, timestamps and anything else keep their Arrow display form
        _ => {
            let options = FormatOptions::default();
            let formatter = ArrayFormatter::try_new(array.as_ref(), &options).map_err(arrow_error)?;
            out.extend((0..array.len()).map(|i| {
                if array.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Text(formatter.value(i).to_string())
                }
            }));
        }
    }

    Ok(())
}

fn append_strings(out: &mut Vec<CellValue>, array: &ArrayRef) -> LoadResult<()> {
    let strings = cast(array, &DataType::Utf8).map_err(arrow_error)?;
    let strings = strings.as_string::<i32>();
    out.extend((0..strings.len()).map(|i| {
        if strings.is_null(i) {
            CellValue::Null
        } else {
            CellValue::Text(strings.value(i).to_string())
        }
    }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    #[test]
    fn test_read_parquet_types() {
        let batch = RecordBatch::try_from_iter(vec![
            ("KODE OUTLET", Arc::new(StringArray::from(vec![Some("O1"), None, Some("O2")])) as ArrayRef),
            ("KD_BRG", Arc::new(Int64Array::from(vec![303174, 303174, 100200])) as ArrayRef),
            ("QTY", Arc::new(Float64Array::from(vec![Some(1.0), Some(2.5), None])) as ArrayRef),
        ])
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let set = read_parquet(file.path()).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.column_names(), vec!["KODE OUTLET", "KD_BRG", "QTY"]);
        assert_eq!(set.value("KODE OUTLET", 1), Some(&CellValue::Null));
        assert_eq!(set.value("KD_BRG", 0), Some(&CellValue::Int(303174)));
        assert_eq!(set.value("QTY", 1), Some(&CellValue::Float(2.5)));
        assert_eq!(set.sum("QTY"), 3.5);
    }
}
