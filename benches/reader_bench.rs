use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use conslisp::lexer::tokenize;
use conslisp::parser::read_all;
use conslisp::session::Session;

const PROGRAM: &str = r#"
(define fib (n)
  (if (lt n 2)
      n
      (add (fib (sub n 1))
           (fib (sub n 2)))))

(define fact (n)
  (if (eq n 0)
      1
      (mul n (fact (sub n 1)))))

(define compose (f g)
  (lambda (x) (f (g x))))

(set pair '(a . b))
(set mixed '("string with spaces" 123 45.67 -10 1e3 .5 sym))
(cond ((nil? mixed) 'empty)
      ((list? mixed) (car (cdr mixed)))
      (t 'other))
(and (number? 1) (symbol? 'a) (string? "s"))
(or () (quote first) (quote second))
"#;

fn bench_reader(c: &mut Criterion) {
    let input = PROGRAM.repeat(8);
    let mut group = c.benchmark_group("Reader");

    group.bench_with_input(BenchmarkId::new("tokenize", "program"), &input, |b, input| {
        b.iter(|| tokenize(black_box(input)))
    });
    group.bench_with_input(BenchmarkId::new("read_all", "program"), &input, |b, input| {
        b.iter(|| read_all(black_box(input)))
    });

    group.finish();
}

fn bench_evaluator(c: &mut Criterion) {
    let mut group = c.benchmark_group("Evaluator");

    for n in [10, 15] {
        group.bench_with_input(BenchmarkId::new("fib", n), &n, |b, &n| {
            let session = Session::new();
            session.eval_chunk(PROGRAM);
            let call = format!("(fib {})", n);
            b.iter(|| session.eval_str(black_box(&call)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reader, bench_evaluator);
criterion_main!(benches);
