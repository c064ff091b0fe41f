//! `chainwright ask`: Send one prompt to the model.

use super::{CmdResult, load_invoker};

pub async fn run(prompt: String, temperature: Option<f32>) -> CmdResult {
    let (_, invoker) = load_invoker()?;

    let reply = match temperature {
        Some(t) => {
            let options = invoker.options().with_temperature(t);
            invoker.invoke_with(&prompt, &options).await?
        }
        None => invoker.invoke(&prompt).await?,
    };

    println!("{reply}");
    Ok(())
}
