use std::sync::Arc;

use metrics_matcher::{Action, BoxError, Bounds, Matcher, MatcherArg, MatcherOptions, Snapshot};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    // A real setup would ask the browser for its performance metrics here.
    let page = Arc::new(Mutex::new(Snapshot::default()));
    let sampler = {
        let page = page.clone();
        move || {
            let page = page.clone();
            async move { Ok::<_, BoxError>(*page.lock().await) }
        }
    };

    // Opening the menu adds nodes and forces a layout, a bit more every time.
    let mut opened = 0.0;
    let open_menu = {
        let page = page.clone();
        Action::new(move || {
            let page = page.clone();
            opened += 1.0;
            let extra = opened;
            async move {
                let mut page = page.lock().await;
                page.nodes += 40.0 + extra * 10.0;
                page.layout_count += 1.0;
                page.layout_duration += 0.002 * extra;
                Ok(())
            }
        })
    };
    let close_menu = {
        let page = page.clone();
        Action::new(move || {
            let page = page.clone();
            async move {
                page.lock().await.nodes = 0.0;
                Ok(())
            }
        })
    };

    let bounds: Bounds = serde_json::from_str(r#"{"Nodes": 65, "LayoutCount": 1}"#)?;
    let result = Matcher::builder()
        .average_precision(2)
        .build()
        .assert(
            &sampler,
            MatcherArg::Tuple(vec![
                open_menu.into(),
                close_menu.into(),
                MatcherOptions { repeats: 4 }.into(),
            ]),
            &bounds,
        )
        .await?;

    println!("pass: {}", result.pass);
    if !result.pass {
        println!("{}", result.message());
    }
    Ok(())
}
