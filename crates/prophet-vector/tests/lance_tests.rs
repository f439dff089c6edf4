use prophet_core::traits::VectorIndex;
use prophet_core::types::{IndexSpec, VectorRecord};
use prophet_vector::LanceIndex;

fn record(id: &str, values: [f32; 4]) -> VectorRecord {
    VectorRecord { id: id.to_string(), values: values.to_vec() }
}

#[test]
fn lance_round_trip_create_upsert_query() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let index = LanceIndex::open(&tmp.path().to_string_lossy())?;
    index.create_index(&IndexSpec::cosine("pages", 4))?;
    // second create is a no-op
    index.create_index(&IndexSpec::cosine("pages", 4))?;

    index.upsert(
        "pages",
        &[
            record("1", [1.0, 0.0, 0.0, 0.0]),
            record("2", [0.0, 1.0, 0.0, 0.0]),
            record("3", [0.7, 0.7, 0.0, 0.0]),
        ],
    )?;

    let hits = index.query("pages", &[1.0, 0.0, 0.0, 0.0], 2)?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "1");
    assert!((hits[0].score - 1.0).abs() < 1e-4, "cosine similarity of identical vectors");
    assert_eq!(hits[1].id, "3");

    // replacing a vector keeps one row per id
    index.upsert("pages", &[record("2", [1.0, 0.0, 0.0, 0.0])])?;
    let hits = index.query("pages", &[1.0, 0.0, 0.0, 0.0], 10)?;
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().filter(|h| h.id == "2").count() == 1);
    Ok(())
}

#[test]
fn lance_rejects_dimension_mismatch() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let index = LanceIndex::open(&tmp.path().to_string_lossy())?;
    index.create_index(&IndexSpec::cosine("qb", 4))?;
    assert!(index.upsert("qb", &[VectorRecord { id: "1_0".into(), values: vec![1.0] }]).is_err());
    assert!(index.create_index(&IndexSpec::cosine("qb", 8)).is_err());
    Ok(())
}
