use criterion::{criterion_group, criterion_main, Criterion};
use lamina_linalg::{
    broadcast::{matrix_op_vec, BinaryFunctor},
    reduce::{reduce_to_col, reduce_to_row, ReduceFunctor},
};
use lamina_tensor::{ColumnMajor, Tensor1, Tensor2};
use rand::random;
use std::hint::black_box;

const HEIGHT: usize = 512;
const WIDTH: usize = 256;

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");

    let src = Tensor2::<f32>::from_shape_fn([HEIGHT, WIDTH], |_| random::<f32>());
    let src_cm = src.to_layout::<ColumnMajor>();
    let mut row = Tensor1::<f32>::zeros([WIDTH]);
    let mut col = Tensor1::<f32>::zeros([HEIGHT]);

    for rf in [ReduceFunctor::Add, ReduceFunctor::Max, ReduceFunctor::LogAddExp] {
        group.bench_function(format!("to_row_{rf:?}"), |bencher| {
            bencher.iter(|| {
                reduce_to_row(&mut row, &src, rf, 1.0, 0.0).unwrap();
                black_box(&row);
            })
        });

        group.bench_function(format!("to_col_{rf:?}"), |bencher| {
            bencher.iter(|| {
                reduce_to_col(&mut col, &src, rf, 1.0, 0.0).unwrap();
                black_box(&col);
            })
        });
    }

    group.bench_function("to_row_column_major", |bencher| {
        bencher.iter(|| {
            reduce_to_row(&mut row, &src_cm, ReduceFunctor::Add, 1.0, 0.0).unwrap();
            black_box(&row);
        })
    });

    group.finish();
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    let src = Tensor2::<f32>::from_shape_fn([HEIGHT, WIDTH], |_| random::<f32>());
    let v = Tensor1::<f32>::from_shape_fn([WIDTH], |_| random::<f32>());
    let mut dst = Tensor2::<f32>::zeros([HEIGHT, WIDTH]);

    group.bench_function("matrix_op_vec_axpby", |bencher| {
        bencher.iter(|| {
            matrix_op_vec(&mut dst, &src, &v, 1, BinaryFunctor::Axpby(0.5, 2.0), 1.0, 0.0)
                .unwrap();
            black_box(&dst);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_reduce, bench_broadcast);
criterion_main!(benches);
