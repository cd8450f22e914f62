use std::{io, sync::Arc};

use api::RunRequest;
use indexmap::IndexMap;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};

use crate::{
    catalog::Catalog,
    client::ApiClient,
    delivery::{DeliveryConfig, OutputSession, start_session},
    export::export_log,
    form::ParamForm,
    history::History,
    logging,
    output::{OutputPane, SharedPane},
};

/// The interactive console: owns the catalog, the generated form, the
/// output pane, the run history, and the single delivery session.
pub struct ConsoleApp {
    client: ApiClient,
    delivery: DeliveryConfig,
    catalog: Catalog,
    form: ParamForm,
    pane: SharedPane,
    session: Option<OutputSession>,
    history: History,
}

impl ConsoleApp {
    /// Loads the module catalog and builds the form for the default
    /// selection. A catalog fetch or parse failure propagates.
    pub async fn connect(client: ApiClient, delivery: DeliveryConfig) -> Result<Self, reqwest::Error> {
        let catalog = Catalog::load(&client).await?;
        let mut form = ParamForm::default();
        form.rebuild(catalog.selected_params());
        Ok(Self {
            client,
            delivery,
            catalog,
            form,
            pane: Arc::new(tokio::sync::Mutex::new(OutputPane::default())),
            session: None,
            history: History::default(),
        })
    }

    pub async fn run_shell(&mut self) -> io::Result<()> {
        self.print_module_list();
        println!("type 'help' for commands");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            prompt("> ")?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim().to_string();
            let (command, argument) = match line.split_once(' ') {
                Some((command, rest)) => (command, rest.trim()),
                None => (line.as_str(), ""),
            };
            match command {
                "" => {}
                "help" | "?" => print_help(),
                "list" => self.print_module_list(),
                "use" => self.select_module(argument),
                "form" => self.print_form(),
                "run" => {
                    let inputs = self.fill_form(&mut lines).await?;
                    if let Err(err) = self.dispatch_run(inputs).await {
                        error!("run submission failed: {err}");
                    }
                }
                "history" => self.print_history(),
                "save" => {
                    let text = self.pane.lock().await.text().to_string();
                    match export_log(&text) {
                        Ok(path) => info!("log exported to {}", path.display()),
                        Err(err) => error!("log export failed: {err}"),
                    }
                }
                "clear" => self.pane.lock().await.clear(),
                "quit" | "exit" => break,
                other => println!("unknown command: {other} (try 'help')"),
            }
        }

        if let Some(session) = self.session.take() {
            session.shutdown().await;
        }
        Ok(())
    }

    fn select_module(&mut self, argument: &str) {
        let Ok(number) = argument.parse::<usize>() else {
            println!("usage: use <number>");
            return;
        };
        if number == 0 || !self.catalog.select(number - 1) {
            println!("no module #{number}");
            return;
        }
        // Selection change fully discards and rebuilds the field set.
        self.form.rebuild(self.catalog.selected_params());
        if let Some(module) = self.catalog.selected_module() {
            println!("using {}", logging::module_label(&module.name));
        }
    }

    /// Prompts the operator for every generated field in order, then
    /// collects the non-blank values.
    async fn fill_form(
        &mut self,
        lines: &mut Lines<BufReader<Stdin>>,
    ) -> io::Result<IndexMap<String, String>> {
        for field in self.form.fields_mut() {
            loop {
                let hint = if field.placeholder.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", field.placeholder)
                };
                prompt(&format!("{}{hint}: ", logging::field_label(&field.label)))?;
                let value = lines.next_line().await?.unwrap_or_default();
                if field.accepts(&value) {
                    field.value = value;
                    break;
                }
                println!("{} expects a number", field.label);
            }
        }
        Ok(self.form.collect())
    }

    async fn dispatch_run(&mut self, inputs: IndexMap<String, String>) -> Result<(), reqwest::Error> {
        let (path, name) = match self.catalog.selected_module() {
            Some(module) => (module.path.clone(), module.name.clone()),
            None => {
                println!("no module selected");
                return Ok(());
            }
        };

        dispatch(
            &self.client,
            &self.delivery,
            &self.pane,
            &mut self.history,
            &mut self.session,
            &name,
            RunRequest { path, inputs },
        )
        .await
    }

    fn print_module_list(&self) {
        if self.catalog.is_empty() {
            println!("no modules available");
            return;
        }
        for (index, module) in self.catalog.modules().iter().enumerate() {
            let marker = if index == self.catalog.selected_index() {
                logging::selected_marker()
            } else {
                " ".to_string()
            };
            println!(
                "{marker} {:>3}  {}  ({} params)",
                index + 1,
                logging::module_label(&module.name),
                module.inputs.len()
            );
        }
    }

    fn print_form(&self) {
        if self.form.is_empty() {
            println!("selected module takes no parameters");
            return;
        }
        for field in self.form.fields() {
            let kind = if field.kind.is_numeric() { "number" } else { "text" };
            println!(
                "  {} [{kind}] {}",
                logging::field_label(&field.label),
                field.placeholder
            );
        }
    }

    fn print_history(&self) {
        if self.history.is_empty() {
            println!("no runs yet");
            return;
        }
        for entry in self.history.entries() {
            println!(
                "{}  {}  {}",
                logging::time_label(&entry.timestamp),
                logging::module_label(&entry.module_name),
                entry.values_line()
            );
        }
    }
}

/// Submits the run, clears the pane, records history, and starts
/// output delivery for the returned execution id, superseding any
/// session still live from the previous run. A failed submission
/// leaves the pane, the history, and the running session untouched.
pub async fn dispatch(
    client: &ApiClient,
    delivery: &DeliveryConfig,
    pane: &SharedPane,
    history: &mut History,
    session: &mut Option<OutputSession>,
    module_name: &str,
    request: RunRequest,
) -> Result<(), reqwest::Error> {
    let response = client.submit_run(&request).await?;

    pane.lock().await.clear();
    history.record(module_name, &request.inputs);
    info!("run dispatched exec_id={}", response.exec_id);

    *session = Some(
        start_session(
            session.take(),
            client.clone(),
            delivery,
            pane.clone(),
            response.exec_id,
        )
        .await,
    );
    Ok(())
}

fn prompt(text: &str) -> io::Result<()> {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

fn print_help() {
    println!(concat!(
        "  list            show the module catalog\n",
        "  use <number>    select a module\n",
        "  form            show the selected module's parameters\n",
        "  run             fill the form and dispatch a run\n",
        "  history         show dispatched runs, newest first\n",
        "  save            export the output pane to a file\n",
        "  clear           empty the output pane\n",
        "  quit            leave the console\n"
    ));
}
