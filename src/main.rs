use mitschreiben::{record, Describe, Prefix, RecordConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Discounts a list of cash flows at a flat rate.
struct Curve {
    name: String,
    rate: f64,
}

impl Describe for Curve {
    fn describe(&self) -> String {
        format!("Curve({})", self.name)
    }
}

impl Curve {
    fn discount_factor(&self, t: f64) -> mitschreiben::Result<f64> {
        Prefix::of::<Curve>("discount_factor")?.call_on(self, |curve| {
            let df = (-curve.rate * t).exp();
            record!(time = t, factor = df);
            Ok(df)
        })
    }

    fn present_value(&self, flows: &[(f64, f64)]) -> mitschreiben::Result<f64> {
        Prefix::of::<Curve>("present_value")?.call_on(self, |curve| {
            let mut pv = 0.0;
            for (t, amount) in flows {
                pv += amount * curve.discount_factor(*t)?;
            }
            record!(flows = flows.len(), pv = pv);
            Ok(pv)
        })
    }
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::var("MITSCHREIBEN_CONFIG") {
        Ok(raw) => RecordConfig::from_json(&raw)?,
        Err(_) => RecordConfig::default(),
    };
    mitschreiben::record::configure(config);

    let curve = Curve {
        name: "EUR".to_string(),
        rate: 0.03,
    };
    let flows = [(1.0, 5.0), (2.0, 5.0), (3.0, 105.0)];

    let scope = mitschreiben::scope();
    record!(currency = "EUR", rate = curve.rate);
    let pv = curve.present_value(&flows)?;
    scope.close();
    tracing::info!(pv, "calculation finished");

    let tree = mitschreiben::current().to_tree();
    println!("{}", tree.listing());
    println!();
    for table in tree.to_tables().values() {
        println!("{}", table);
        println!();
    }
    for (name, csv) in tree.csv_documents() {
        tracing::debug!(table = %name, lines = csv.lines().count(), "csv document rendered");
    }
    println!("{}", serde_json::to_string_pretty(&tree.flat_json())?);
    Ok(())
}
