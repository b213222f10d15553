//! End-to-end checks: IDX bytes in, trained network through the model store, same outputs back.

use digit_perceptron::{
    decode_digit, hit_report, train_loop, Dataset, Error, ModelRecord, ModelStore, Network,
    TrainConfig,
};

/// Helper: IDX3 image archive followed by the matching IDX1 label archive.
fn idx_archives(rows: usize, cols: usize, samples: &[(Vec<u8>, u8)]) -> (Vec<u8>, Vec<u8>) {
    let mut images = Vec::new();
    images.extend_from_slice(&2051u32.to_be_bytes());
    images.extend_from_slice(&(samples.len() as u32).to_be_bytes());
    images.extend_from_slice(&(rows as u32).to_be_bytes());
    images.extend_from_slice(&(cols as u32).to_be_bytes());

    let mut labels = Vec::new();
    labels.extend_from_slice(&2049u32.to_be_bytes());
    labels.extend_from_slice(&(samples.len() as u32).to_be_bytes());

    for (pixels, label) in samples {
        assert_eq!(pixels.len(), rows * cols);
        images.extend_from_slice(pixels);
        labels.push(*label);
    }
    (images, labels)
}

fn tiny_dataset() -> Dataset {
    let (images, labels) = idx_archives(
        2,
        2,
        &[
            (vec![255, 0, 0, 0], 1),
            (vec![0, 255, 0, 0], 4),
            (vec![0, 0, 255, 255], 8),
        ],
    );
    Dataset::from_idx_bytes(&images, &labels).unwrap()
}

#[test]
fn idx_bytes_are_scaled() {
    let data = tiny_dataset();
    assert_eq!(data.len(), 3);
    let (image, label) = data.sample(2).unwrap();
    assert_eq!(image, &[0.0, 0.0, 1.0, 1.0]);
    assert!((label - 0.8).abs() < 1e-12);
    assert_eq!(decode_digit(label), 8);
}

#[test]
fn trained_network_survives_save_and_load() {
    let data = tiny_dataset();
    let mut network = Network::with_seed(4, 1, 0.3, &[5, 3], 21).unwrap();
    train_loop(&mut network, &data, None, &TrainConfig::new(50, 0.03), |_| {}).unwrap();
    let report = hit_report(&mut network, &data, &data, 0.03).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::open(dir.path()).unwrap();
    let record = ModelRecord::new("roundtrip", &network, report.test_hits, report.training_hits);
    store.save(&record).unwrap();

    let loaded = store.load("roundtrip").unwrap();
    assert_eq!(loaded.training_hits, report.training_hits);
    assert_eq!(loaded.test_hits, report.test_hits);

    let mut reloaded = loaded.into_network().unwrap();
    assert_eq!(reloaded.layer_sizes(), network.layer_sizes());
    for (image, _) in data.iter() {
        let before = network.classify(image).unwrap();
        let after = reloaded.classify(image).unwrap();
        assert_eq!(before, after, "outputs differ after reload");
    }

    let held_out = [0.5, 0.25, 0.0, 1.0];
    let before = network.infer(&held_out).unwrap().to_vec();
    let after = reloaded.infer(&held_out).unwrap().to_vec();
    assert_eq!(before, after, "held-out output differs after reload");
}

#[test]
fn second_save_under_same_name_leaves_first_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::open(dir.path()).unwrap();

    let first = Network::with_seed(4, 1, 0.2, &[2], 1).unwrap();
    let second = Network::with_seed(4, 1, 0.2, &[2], 2).unwrap();
    store.save(&ModelRecord::new("A", &first, 0, 0)).unwrap();
    let on_disk = std::fs::read(store.model_path("A")).unwrap();

    let err = store.save(&ModelRecord::new("A", &second, 3, 3)).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(ref name) if name == "A"));
    assert_eq!(std::fs::read(store.model_path("A")).unwrap(), on_disk);
    assert_eq!(store.list().unwrap(), vec!["A"]);
}

#[test]
fn loading_an_unknown_name_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::open(dir.path()).unwrap();
    assert!(matches!(store.load("missing"), Err(Error::NotFound(_))));
}
