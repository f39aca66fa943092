use criterion::{black_box, criterion_group, criterion_main, Criterion};

use plasvar::analysis_config::AnalysisConfigBuilder;
use plasvar::example_gen::generate_observations;
use plasvar::variant_analyzer::VariantAnalyzer;
use plasvar::variant_index::VariantIndex;

pub fn bench_variants(c: &mut Criterion) {
    let seq_lens = [238, 1000];
    let num_variants = [10, 100];
    let num_sources = [1000, 10000];

    let mut benchmark_group = c.benchmark_group("variant-group");
    benchmark_group.sample_size(10);

    for &sl in seq_lens.iter() {
        // keep the same relative margin on longer proteins
        let config = AnalysisConfigBuilder::default()
            .trim_window(Some(plasvar::mutation::TrimWindow::scaled(sl, 4)))
            .build().unwrap();
        for &nv in num_variants.iter() {
            for &ns in num_sources.iter() {
                let (reference, dataset) = generate_observations("mGFP", sl, nv, ns, 3);

                let test_label = format!("index_{sl}x{nv}x{ns}");
                benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                    black_box(VariantIndex::new(dataset.iter().cloned()))
                }));

                let index = VariantIndex::new(dataset);
                let test_label = format!("variant_mutations_{sl}x{nv}x{ns}");
                benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                    black_box({
                        let analyzer = VariantAnalyzer::with_config(&index, config.clone());
                        analyzer.variant_mutations("mGFP", &reference)
                    });
                }));
            }
        }
    }

    benchmark_group.finish();
}

criterion_group!(benches, bench_variants);
criterion_main!(benches);
