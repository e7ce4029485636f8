//! End-to-end lowering tests: build tensors, lower them, and execute the
//! resulting loop nests with the reference interpreter.

use weft::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_elementwise_add_end_to_end() {
    init_logging();

    let a = Placeholder::new("a", &[4i64, 4]);
    let b = Placeholder::new("b", &[4i64, 4]);
    let add = Tensor::compute(
        "add",
        &[DimArg::named(4i64, "i"), DimArg::named(4i64, "j")],
        |i: Var, j: Var| a.load(&[i.clone(), j.clone()]) + b.load(&[i, j]),
    )
    .unwrap();

    // Two-deep nest: i outermost, j innermost, one store at the bottom.
    let stmt = add.lower_to_stmt();
    let Stmt::For { var, body, .. } = &stmt else {
        panic!("expected outer For");
    };
    assert_eq!(var, add.arg(0));
    let Stmt::For { var, body, .. } = body.as_ref() else {
        panic!("expected inner For");
    };
    assert_eq!(var, add.arg(1));
    assert!(matches!(body.as_ref(), Stmt::Store { .. }));

    let mut ev = Evaluator::new();
    ev.bind_buffer("a", (0..16).map(f64::from).collect());
    ev.bind_buffer("b", vec![100.0; 16]);
    ev.run(&stmt).unwrap();

    let out = ev.buffer("add").unwrap();
    let expected: Vec<f64> = (0..16).map(|v| f64::from(v) + 100.0).collect();
    assert_eq!(out, expected.as_slice());
}

#[test]
fn test_row_sum_reduction_end_to_end() {
    init_logging();

    let a = Placeholder::new("a", &[3i64, 5]);
    let row_sum = Tensor::reduce(
        "row_sum",
        &[DimArg::named(3i64, "n")],
        &Reducer::sum(),
        &a,
        &[DimArg::named(5i64, "k")],
    )
    .unwrap();

    let stmt = row_sum.lower_to_stmt();
    let mut ev = Evaluator::new();
    // a[n, k] = n * 5 + k
    ev.bind_buffer("a", (0..15).map(f64::from).collect());
    ev.run(&stmt).unwrap();

    let out = ev.buffer("row_sum").unwrap();
    assert_eq!(out, &[10.0, 35.0, 60.0]);
}

#[test]
fn test_row_max_reduction_end_to_end() {
    init_logging();

    let a = Placeholder::new("a", &[2i64, 3]);
    let row_max = Tensor::reduce(
        "row_max",
        &[DimArg::named(2i64, "n")],
        &Reducer::maximum(f64::NEG_INFINITY),
        &a,
        &[DimArg::named(3i64, "k")],
    )
    .unwrap();

    let mut ev = Evaluator::new();
    ev.bind_buffer("a", vec![1.0, 7.0, -2.0, 5.0, 0.5, 6.0]);
    ev.run(&row_max.lower_to_stmt()).unwrap();
    assert_eq!(ev.buffer("row_max").unwrap(), &[7.0, 6.0]);
}

#[test]
fn test_matmul_via_reduce_over_tensor() {
    init_logging();

    // 2x3 times 3x2: materialize the elementwise products, then sum over k.
    let a = Placeholder::new("a", &[2i64, 3]);
    let b = Placeholder::new("b", &[3i64, 2]);
    let prod = Tensor::compute(
        "prod",
        &[
            DimArg::named(2i64, "i"),
            DimArg::named(2i64, "j"),
            DimArg::named(3i64, "k"),
        ],
        |i: Var, j: Var, k: Var| a.load(&[i, k.clone()]) * b.load(&[k, j]),
    )
    .unwrap();
    let mm = Tensor::reduce_over(
        "mm",
        &[DimArg::named(2i64, "i"), DimArg::named(2i64, "j")],
        &Reducer::sum(),
        &prod,
        &[DimArg::named(3i64, "k")],
    )
    .unwrap();

    let mut ev = Evaluator::new();
    ev.bind_buffer("a", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    ev.bind_buffer("b", vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    // The product tensor must be materialized before the reduction reads it.
    ev.run(&prod.lower_to_stmt()).unwrap();
    ev.run(&mm.lower_to_stmt()).unwrap();

    assert_eq!(ev.buffer("mm").unwrap(), &[4.0, 5.0, 10.0, 11.0]);
}

#[test]
fn test_accumulator_reset_per_output_index() {
    init_logging();

    let a = Placeholder::new("a", &[2i64, 2]);
    let sums = Tensor::reduce(
        "sums",
        &[DimArg::named(2i64, "n")],
        &Reducer::sum(),
        &a,
        &[DimArg::named(2i64, "k")],
    )
    .unwrap();
    let stmt = sums.lower_to_stmt();

    // Run twice over the same evaluator: the initializer store resets the
    // accumulator, so the result must not double.
    let mut ev = Evaluator::new();
    ev.bind_buffer("a", vec![1.0, 2.0, 3.0, 4.0]);
    ev.run(&stmt).unwrap();
    ev.run(&stmt).unwrap();
    assert_eq!(ev.buffer("sums").unwrap(), &[3.0, 7.0]);
}

#[test]
fn test_zero_extent_axis_stores_nothing() {
    init_logging();

    let t = Tensor::compute("empty", &[DimArg::named(0i64, "i")], |i: Var| {
        i.expr() * 2i64
    })
    .unwrap();
    let mut ev = Evaluator::new();
    ev.run(&t.lower_to_stmt()).unwrap();
    assert!(ev.buffer("empty").is_none());
}

#[test]
fn test_pretty_printed_nest() {
    init_logging();

    let a = Placeholder::new("a", &[4i64, 8]);
    let row_sum = Tensor::reduce(
        "out",
        &[DimArg::named(4i64, "n")],
        &Reducer::sum(),
        &a,
        &[DimArg::named(8i64, "k")],
    )
    .unwrap();
    let text = row_sum.lower_to_stmt().to_string();
    assert_eq!(
        text,
        "for (int n = 0; n < 4; n++) {\n\
         \x20 out[n] = 0;\n\
         \x20 for (int k = 0; k < 8; k++) {\n\
         \x20   out[n] = (out[n] + a[n, k]);\n\
         \x20 }\n\
         }\n"
    );
}
