mod es_cluster;
mod newman_tools;
#[cfg(test)]
mod test_log;

use std::io::{self, Write};
use structopt::StructOpt;

use es_cluster::{Cluster, EsCluster, EsError, CLIENT_VERSION};
use newman_tools::Options;

// Every path exits 0, error paths included; failures are only reported on stderr.
fn main() {
    let opts = Options::from_args();
    init_logger(opts.verbose);

    let stdout = io::stdout();
    if let Err(err) = start(&opts, EsCluster::connect, &mut stdout.lock()) {
        log::error!("Error:  Unable to write output: {}", err);
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { log::LevelFilter::Info } else { log::LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

/// Version info short-circuits; everything else connects first, then runs one command.
fn start<C, F>(opts: &Options, connect: F, out: &mut impl Write) -> io::Result<()>
where
    C: Cluster,
    F: FnOnce(&str) -> Result<C, EsError>,
{
    log::info!("verbose is:  {}", opts.verbose);
    log::info!("Elasticsearch client module is:  {}", CLIENT_VERSION);

    if opts.version {
        return print_version_info(out);
    }

    let cluster = match connect(&opts.es_cluster) {
        Ok(cluster) => cluster,
        Err(err) => {
            log::error!("Error:  Unable to connect to elasticsearch cluster! {}", err);
            return Ok(());
        }
    };
    newman_tools::run(opts, &cluster, out)
}

fn print_version_info(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "version is:  {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "Elasticsearch client module version is:  {}", CLIENT_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use log::Level;

    fn options(args: &[&str]) -> Options {
        let mut argv = vec!["newman-es-tools"];
        argv.extend_from_slice(args);
        Options::from_iter_safe(argv).unwrap()
    }

    #[test]
    fn version_never_connects() {
        let hosts = RefCell::new(Vec::new());
        let mut out = Vec::new();
        start(&options(&["--version", "--list", "--esCluster", "es1"]), |host: &str| {
            hosts.borrow_mut().push(host.to_string());
            Err::<EsCluster, _>(EsError::InvalidUrl(host.to_string()))
        }, &mut out).unwrap();

        assert!(hosts.borrow().is_empty());
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, format!(
            "version is:  {}\nElasticsearch client module version is:  {}\n",
            env!("CARGO_PKG_VERSION"), CLIENT_VERSION));
    }

    #[test]
    fn failed_connect_is_logged_and_stops() {
        test_log::capture();
        let hosts = RefCell::new(Vec::new());
        let mut out = Vec::new();
        start(&options(&["--list", "--esCluster", "es1"]), |host: &str| {
            hosts.borrow_mut().push(host.to_string());
            Err::<EsCluster, _>(EsError::InvalidUrl(host.to_string()))
        }, &mut out).unwrap();

        assert_eq!(*hosts.borrow(), vec!["es1".to_string()]);
        assert!(out.is_empty());
        let errors = test_log::messages(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error:  Unable to connect to elasticsearch cluster!"));
        assert!(errors[0].contains("es1"));
    }
}
