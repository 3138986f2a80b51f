mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::fs;
use taxon_ingest::core::batch::EntryStatus;
use taxon_ingest::core::pipeline::StageStatus;
use taxon_ingest::{BatchOptions, BatchOrchestrator, IngestError, IngestOptions, RecordStore, TaxonKey};

fn options(force: bool) -> BatchOptions {
    BatchOptions {
        ingest: IngestOptions {
            core_taxa: true,
            annotate: true,
            cpus: 2,
            force,
            ..IngestOptions::default()
        },
        show_progress: false,
    }
}

#[test]
fn test_batch_resolves_names_and_builds_everything() {
    let env = TestEnvironment::new();
    env.create_input_file("human.fa", ">h1|x\nMKV*\n");
    env.create_input_file("mouse.fa", ">m1\nLLA\n");
    env.create_input_file("unknown.fa", ">u1\nWWW\n");
    let manifest = env.create_manifest(
        "# filename\ttaxid\tname\tversion\n\
         human.fa\t9606\t\t3\n\
         mouse.fa\t10090\tmouse\t1\n\
         unknown.fa\t424242\t\t1\n",
    );

    let store = RecordStore::new(&env.output_root);
    let taxonomy = test_taxonomy();
    let indexer = RecordingIndexer::default();
    let annotator = RecordingAnnotator::default();
    let batch = BatchOrchestrator::new(&store, &taxonomy, &indexer, &annotator);

    let report = batch.run(&manifest, &env.input_dir, &options(false)).unwrap();
    assert_eq!((report.succeeded, report.skipped, report.failed), (3, 0, 0));

    let keys: Vec<String> = store.list_taxa().unwrap().iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["HOMSA@9606@3", "MOUSE@10090@1", "UNK424242@424242@1"]);
    assert_eq!(indexer.call_count(), 3);
    assert_eq!(annotator.requests.lock().unwrap().len(), 3);

    let human = TaxonKey::new("HOMSA", 9606, "3");
    assert_eq!(
        fs::read_to_string(store.layout().fasta_path(&human)).unwrap(),
        ">h1_x\nMKV\n"
    );
}

#[test]
fn test_duplicate_manifest_keys_without_force_abort() {
    let env = TestEnvironment::new();
    env.create_input_file("a.fa", ">first\nAAA\n");
    env.create_input_file("b.fa", ">second\nCCC\n");
    let manifest = env.create_manifest("a.fa\t9606\tHUMAN\t1\nb.fa\t9606\tHUMAN\t1\n");

    let store = RecordStore::new(&env.output_root);
    let taxonomy = test_taxonomy();
    let indexer = RecordingIndexer::default();
    let annotator = RecordingAnnotator::default();
    let batch = BatchOrchestrator::new(&store, &taxonomy, &indexer, &annotator);

    let err = batch.run(&manifest, &env.input_dir, &options(false)).unwrap_err();
    match &err {
        IngestError::Collision(list) => {
            let files: Vec<&str> = list.iter().map(|c| c.file.as_str()).collect();
            assert_eq!(files, vec!["a.fa", "b.fa"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("a.fa -> HUMAN@9606@1"));
    assert!(message.contains("b.fa -> HUMAN@9606@1"));

    assert!(!env.output_root.join("genome_dir").join("HUMAN@9606@1").exists());
    assert_eq!(indexer.call_count(), 0);
}

#[test]
fn test_duplicate_manifest_keys_with_force_keep_later_entry() {
    let env = TestEnvironment::new();
    env.create_input_file("a.fa", ">first\nAAA\n");
    env.create_input_file("b.fa", ">second\nCCC\n");
    let manifest = env.create_manifest("a.fa\t9606\tHUMAN\t1\nb.fa\t9606\tHUMAN\t1\n");

    let store = RecordStore::new(&env.output_root);
    let taxonomy = test_taxonomy();
    let indexer = RecordingIndexer::default();
    let annotator = RecordingAnnotator::default();
    let batch = BatchOrchestrator::new(&store, &taxonomy, &indexer, &annotator);

    let report = batch.run(&manifest, &env.input_dir, &options(true)).unwrap();
    assert_eq!(report.succeeded, 2);

    let taxa = store.list_taxa().unwrap();
    assert_eq!(taxa, vec![TaxonKey::new("HUMAN", 9606, "1")]);
    assert_eq!(
        fs::read_to_string(store.layout().fasta_path(&taxa[0])).unwrap(),
        ">second\nCCC\n"
    );
}

#[test]
fn test_existing_taxon_collision_lists_file_and_key() {
    let env = TestEnvironment::new();
    env.create_input_file("h.fa", ">x\nMKV\n");
    let manifest = env.create_manifest("h.fa\t9606\tHUMAN\t1\n");
    let store = RecordStore::new(&env.output_root);
    let taxonomy = test_taxonomy();
    let indexer = RecordingIndexer::default();
    let annotator = RecordingAnnotator::default();
    let batch = BatchOrchestrator::new(&store, &taxonomy, &indexer, &annotator);

    batch.run(&manifest, &env.input_dir, &options(false)).unwrap();
    let err = batch.run(&manifest, &env.input_dir, &options(false)).unwrap_err();
    assert!(err.to_string().contains("h.fa -> HUMAN@9606@1"));
}

#[test]
fn test_tool_failure_does_not_stop_batch() {
    let env = TestEnvironment::new();
    env.create_input_file("a.fa", ">a\nAAA\n");
    env.create_input_file("b.fa", ">b\nCCC\n");
    let manifest = env.create_manifest("a.fa\t9606\tHUMAN\t1\nb.fa\t10090\tMOUSE\t1\n");

    let store = RecordStore::new(&env.output_root);
    let taxonomy = test_taxonomy();
    let indexer = RecordingIndexer::failing();
    let annotator = RecordingAnnotator::default();
    let batch = BatchOrchestrator::new(&store, &taxonomy, &indexer, &annotator);

    let report = batch.run(&manifest, &env.input_dir, &options(false)).unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(indexer.call_count(), 2);
    for entry in &report.entries {
        match &entry.status {
            EntryStatus::Succeeded { outcome } => {
                assert!(outcome.blast.is_failed());
                assert_eq!(outcome.annotation, StageStatus::Completed);
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }
}

#[test]
fn test_missing_manifest_is_configuration_error() {
    let env = TestEnvironment::new();
    let store = RecordStore::new(&env.output_root);
    let taxonomy = test_taxonomy();
    let indexer = RecordingIndexer::default();
    let annotator = RecordingAnnotator::default();
    let batch = BatchOrchestrator::new(&store, &taxonomy, &indexer, &annotator);

    let err = batch
        .run(&env.temp_dir.path().join("nope.txt"), &env.input_dir, &options(false))
        .unwrap_err();
    assert!(matches!(err, IngestError::Configuration(_)));
}
