mod matmul;
mod softmax;
mod unary;

use criterion::criterion_group;

criterion_group!(benches, matmul::basic, unary::basic, softmax::basic);
