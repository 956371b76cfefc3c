mod common;

use std::sync::Arc;

use common::{EnvelopeModel, NoiseMaterial};
use srtlab::{Experiment, RunOptions};

#[test]
fn multi_output_predictions_flatten_to_one_row_each() {
    let model = Arc::new(EnvelopeModel);
    let mut experiment = Experiment::new(vec![model], vec![0.0, 5.0]);
    experiment.config.write = false;

    let mut material = NoiseMaterial::new(2, 1024);
    let opts = RunOptions {
        n: Some(2),
        seed: 9,
        ..Default::default()
    };
    let table = experiment.run(&mut material, &opts).unwrap();

    // 2 sentences x 2 SNRs x 3 named outputs
    assert_eq!(table.len(), 12);

    // rows from the same prediction share identical condition metadata and
    // carry the untouched full prediction
    for chunk in table.rows().chunks(3) {
        let first = &chunk[0];
        for row in chunk {
            assert_eq!(row.model, "envelope");
            assert_eq!(row.sentence, first.sentence);
            assert_eq!(row.snr, first.snr);
            assert_eq!(
                row.full_prediction.as_ref().unwrap(),
                first.full_prediction.as_ref().unwrap()
            );
        }
        let mut outputs: Vec<&str> = chunk.iter().map(|r| r.output.as_str()).collect();
        outputs.sort_unstable();
        assert_eq!(outputs, vec!["env_head", "env_rms", "target_rms"]);
    }
}
