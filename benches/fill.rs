use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crossfill::{find_fill, generate_grid_config_from_template_string, FillOptions, WordList};

const TEMPLATE: &str = "
    ___
    ___
    ___
";

const WORDS: &[&str] = &[
    "ACE", "ARE", "ART", "BAT", "BED", "BIN", "CAB", "CAT", "COB", "DEN", "DOG", "EAR", "END",
    "EON", "NOD", "OAT", "ONE", "PEN", "SAP", "SOD", "SPA", "TEA", "TEN", "ANE",
];

pub fn criterion_benchmark(c: &mut Criterion) {
    let config =
        generate_grid_config_from_template_string(WordList::new(WORDS.iter().copied()), TEMPLATE)
            .expect("failed to parse template");

    for forward_checking in [false, true] {
        let options = FillOptions::default().with_forward_checking(forward_checking);
        c.bench_with_input(
            BenchmarkId::new("find_fill_3x3", forward_checking),
            &options,
            |b, options| {
                b.iter(|| find_fill(black_box(&config), options));
            },
        );
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
