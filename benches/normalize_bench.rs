use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use taxon_ingest::bio::fasta::FastaReader;
use taxon_ingest::core::normalizer::{AlphabetPolicy, DuplicatePolicy, Normalizer};

fn generate_proteome(num_sequences: usize, seq_length: usize) -> String {
    let mut content = String::new();
    let residues = b"ACDEFGHIKLMNPQRSTVWY";

    for i in 0..num_sequences {
        content.push_str(&format!(">tr|Q{:05}|PROT_{} description\n", i, i));
        for j in 0..seq_length {
            // every 97th residue is a digit so the sanitizer has work to do
            if (i + j) % 97 == 0 {
                content.push('1');
            } else {
                content.push(residues[(i * 7 + j) % residues.len()] as char);
            }
            if (j + 1) % 60 == 0 {
                content.push('\n');
            }
        }
        content.push_str("*\n");
    }

    content
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for num_seqs in [100, 1000, 10000].iter() {
        let content = generate_proteome(*num_seqs, 350);
        group.throughput(Throughput::Bytes(content.len() as u64));

        for policy in [AlphabetPolicy::Replace, AlphabetPolicy::Delete] {
            let normalizer = Normalizer::new(policy, DuplicatePolicy::Reject);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", policy), num_seqs),
                &content,
                |b, content| {
                    b.iter(|| {
                        let reader = FastaReader::new(content.as_bytes());
                        let count = normalizer
                            .normalize(reader)
                            .filter(|r| r.is_ok())
                            .count();
                        black_box(count);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
