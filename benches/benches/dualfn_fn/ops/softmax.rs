use benches::{configure, matrix, operand, SIZES};
use criterion::{black_box, Criterion};
use dualfn_fn::{
    ops::{LogSoftmax, SparseMax, Softmax},
    Function, OperandRef,
};

type Build = Box<dyn Fn(OperandRef<f32>) -> Box<dyn Function<f32>>>;

fn boxed<F>(build: F) -> Build
where
    F: Fn(OperandRef<f32>) -> Box<dyn Function<f32>> + 'static,
{
    Box::new(build)
}

pub fn basic(criterion: &mut Criterion) {
    configure();

    let mut group = criterion.benchmark_group("softmax/forward_backward");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(50);

    let functions: Vec<(&str, Build)> = vec![
        ("softmax", boxed(|x| Box::new(Softmax::new(x)))),
        ("log_softmax", boxed(|x| Box::new(LogSoftmax::new(x)))),
        // sorting dominates here
        ("sparsemax", boxed(|x| Box::new(SparseMax::new(x)))),
    ];

    for (name, build) in &functions {
        for &(size, size_name) in &SIZES {
            // one long vector per size
            let len = size * size;
            let bench_name = format!("{}/{}/{}", name, size_name, len);
            let x = operand::<f32>(len, 1);
            let gy = matrix::<f32>(len, 1);
            group.bench_function(&bench_name, |b| {
                b.iter(|| {
                    let mut f = build(x.clone());
                    black_box(f.forward()).unwrap();
                    black_box(f.backward(&gy)).unwrap();
                })
            });
        }
    }

    group.finish();
}
