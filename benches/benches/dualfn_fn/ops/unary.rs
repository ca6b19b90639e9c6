use benches::{configure, matrix, operand, SIZES};
use criterion::{black_box, Criterion};
use dualfn_fn::{
    ops::{Exp, Mish, ReLU, Sigmoid, Tanh, GELU},
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

    let mut group = criterion.benchmark_group("unary/forward_backward");
    group.warm_up_time(core::time::Duration::from_millis(500));
    group.measurement_time(core::time::Duration::from_secs(3));
    group.sample_size(50);

    let functions: Vec<(&str, Build)> = vec![
        ("sigmoid", boxed(|x| Box::new(Sigmoid::new(x)))),
        ("tanh", boxed(|x| Box::new(Tanh::new(x)))),
        ("relu", boxed(|x| Box::new(ReLU::new(x)))),
        ("gelu", boxed(|x| Box::new(GELU::new(x)))),
        ("mish", boxed(|x| Box::new(Mish::new(x)))),
        ("exp", boxed(|x| Box::new(Exp::new(x)))),
    ];

    for (name, build) in &functions {
        for &(size, size_name) in &SIZES {
            let bench_name = format!("{}/{}/{}x{}", name, size_name, size, size);
            let x = operand::<f32>(size, size);
            let gy = matrix::<f32>(size, size);
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
