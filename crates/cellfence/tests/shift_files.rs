//! Insert-then-delete through saved files leaves the workbook's values as they were

use cellfence::{Engine, EngineConfig};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_grid() -> impl Strategy<Value = Vec<Vec<i64>>> {
    (1usize..6, 1usize..5).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::collection::vec(-1000i64..1000, cols), rows)
    })
}

fn run(engine: &Engine, command: Value) -> Value {
    engine
        .execute_json(command.clone())
        .unwrap_or_else(|e| panic!("{} failed: {}", command, e))
}

fn read_block(engine: &Engine) -> Value {
    run(
        engine,
        json!({"op": "read_range", "path": "book.xlsx", "sheet": "Sheet1", "range": "A1:H12"}),
    )["values"]
        .clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn insert_then_delete_restores_values(
        grid in arb_grid(),
        columns in any::<bool>(),
        at in 1i64..10,
        count in 1i64..4,
    ) {
        let root = tempfile::tempdir().unwrap();
        let engine = Engine::new(&EngineConfig::new(root.path())).unwrap();
        run(&engine, json!({
            "op": "write_range", "path": "book.xlsx", "sheet": "Sheet1",
            "start_cell": "B2", "values": grid,
        }));
        run(&engine, json!({
            "op": "write_cell", "path": "book.xlsx", "sheet": "Sheet1",
            "cell": "A1", "value": "=SUM(B2:F7)",
        }));
        let before = read_block(&engine);

        let (insert, delete) = if columns {
            ("insert_columns", "delete_columns")
        } else {
            ("insert_rows", "delete_rows")
        };
        let shift = |op: &str| json!({
            "op": op, "path": "book.xlsx", "sheet": "Sheet1", "at": at, "count": count,
        });
        run(&engine, shift(insert));
        run(&engine, shift(delete));

        prop_assert_eq!(read_block(&engine), before);
    }
}
