use benches::{configure, matrix, operand, SIZES};
use criterion::{black_box, Criterion};
use dualfn_fn::{
    ops::{Affine, Mul, MulT},
    Function, OperandRef,
};

type Build = Box<dyn Fn(OperandRef<f32>, OperandRef<f32>, OperandRef<f32>) -> Box<dyn Function<f32>>>;

fn boxed<F>(build: F) -> Build
where
    F: Fn(OperandRef<f32>, OperandRef<f32>, OperandRef<f32>) -> Box<dyn Function<f32>> + 'static,
{
    Box::new(build)
}

fn bench_function(b: &mut criterion::Bencher, size: usize, build: &Build) {
    let x1 = operand::<f32>(size, size);
    let x2 = operand::<f32>(size, size);
    let bias = operand::<f32>(size, size);
    let gy = matrix::<f32>(size, size);

    b.iter(|| {
        let mut f = build(x1.clone(), x2.clone(), bias.clone());
        black_box(f.forward()).unwrap();
        black_box(f.backward(&gy)).unwrap();
    })
}

pub fn basic(criterion: &mut Criterion) {
    configure();

    let mut group = criterion.benchmark_group("matmul/forward_backward");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(20);

    let functions: Vec<(&str, Build)> = vec![
        ("mul", boxed(|a, b, _| Box::new(Mul::new(a, b)))),
        ("mul_t", boxed(|a, b, _| Box::new(MulT::new(a, b)))),
        ("affine", boxed(|a, b, bias| Box::new(Affine::new(bias, a, b, Vec::new()).unwrap()))),
    ];

    for (name, build) in &functions {
        for &(size, size_name) in &SIZES {
            let bench_name = format!("{}/{}/{}x{}", name, size_name, size, size);
            group.bench_function(&bench_name, |b| bench_function(b, size, build));
        }
    }

    group.finish();
}
