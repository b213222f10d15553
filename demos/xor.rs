use digit_perceptron::Network;

fn main() -> digit_perceptron::Result<()> {
    let mut network = Network::with_seed(2, 1, 0.5, &[3], 7)?;

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    let epochs = 10000;

    for epoch in 0..epochs {
        let mut loss = 0.0;
        for (input, expected) in inputs.iter().zip(&expected_outputs) {
            network.train_step(input, expected)?;
            let actual = network.infer(input)?[0];
            loss += (expected[0] - actual).powi(2);
        }
        if epoch % 1000 == 0 {
            println!("Epoch {epoch}: loss = {:.6}", loss / inputs.len() as f64);
        }
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.classify(input)?[0]);
    }
    Ok(())
}
