//! Case table generation.

use tracing::debug;

use tracegen_core::{CaseId, CaseRecord, FieldRole, Record, TableKind, Value};

use crate::error::Result;
use crate::progress::{ProgressSink, Stage};
use crate::vocabulary::Vocabulary;

/// Produce `num_cases` case records.
///
/// The primary-key column holds the case's 1-based ordinal; every other
/// column is sampled by its field's semantic name. `num_cases == 0` yields
/// an empty table.
///
/// # Errors
///
/// Fails with a schema error, before sampling anything, when the cases
/// schema has no unique primary key.
pub fn generate_cases<V>(
    vocabulary: &mut V,
    num_cases: u64,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<CaseRecord>>
where
    V: Vocabulary + ?Sized,
{
    let schema = vocabulary.schema(TableKind::Cases).clone();
    schema.validate(TableKind::Cases)?;

    debug!(num_cases, columns = schema.columns.len(), "Generating case table");

    let mut cases = Vec::with_capacity(num_cases as usize);
    for ordinal in 1..=num_cases {
        let id = CaseId::new(ordinal);
        let mut record = Record::with_capacity(schema.columns.len());
        for field in &schema.columns {
            let value = match field.role() {
                FieldRole::PrimaryKey => Value::from(ordinal),
                _ => vocabulary.sample(&field.name),
            };
            record.push(field.display_name.clone(), value);
        }
        cases.push(CaseRecord::new(id, record));
        progress.update(Stage::Cases, ordinal, num_cases);
    }
    progress.finish(Stage::Cases, num_cases);

    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::order_vocabulary;
    use crate::progress::{LogProgress, NoProgress};
    use crate::static_vocab::StaticVocabulary;
    use tracegen_core::SchemaError;

    #[test]
    fn test_contiguous_primary_keys() {
        let mut vocab = order_vocabulary(1);
        let cases = generate_cases(&mut vocab, 25, &mut NoProgress).unwrap();

        assert_eq!(cases.len(), 25);
        for (i, case) in cases.iter().enumerate() {
            let expected = (i + 1) as u64;
            assert_eq!(case.id, CaseId(expected));
            assert_eq!(case.record.get("Case ID"), Some(&Value::Integer(expected as i64)));
        }
    }

    #[test]
    fn test_zero_cases() {
        let mut vocab = order_vocabulary(1);
        let cases = generate_cases(&mut vocab, 0, &mut NoProgress).unwrap();
        assert!(cases.is_empty());
    }

    #[test]
    fn test_sampled_columns_in_schema_order() {
        let mut vocab = order_vocabulary(4);
        let cases = generate_cases(&mut vocab, 3, &mut NoProgress).unwrap();

        for case in &cases {
            assert_eq!(
                case.record.columns().collect::<Vec<_>>(),
                vec!["Case ID", "Customer", "Amount"]
            );
            let customer = case.record.get("Customer").and_then(Value::as_text).unwrap();
            assert!(["Acme", "Globex", "Initech"].contains(&customer));
        }
    }

    #[test]
    fn test_progress_does_not_change_output() {
        let mut quiet = order_vocabulary(8);
        let mut loud = order_vocabulary(8);

        let a = generate_cases(&mut quiet, 40, &mut NoProgress).unwrap();
        let b = generate_cases(&mut loud, 40, &mut LogProgress::new(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_primary_key() {
        let mut document = order_vocabulary(0).document().clone();
        document.schema.cases.columns[0].primary_key = false;
        document
            .values
            .insert("case_id".into(), crate::static_vocab::ValueSource::choice(["x"]));

        let err = StaticVocabulary::new(document, 0).unwrap_err();
        assert_eq!(err, SchemaError::missing(TableKind::Cases, "primary_key"));
    }
}
