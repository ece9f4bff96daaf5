//! Chat command - interactive document chat (REPL).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use studydesk_chat::{
    DocumentChat, DocumentChatRequest, DocumentRef, OpenAiChatModel, OpenAiConfig,
    TextDocumentRetriever,
};
use studydesk_session::{CacheConfig, SessionCache};
use studydesk_types::Role;

use super::Context;

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Plain-text document to chat with
    #[arg(short, long)]
    pub document: PathBuf,

    /// User that owns the chat session
    #[arg(short, long, env = "STUDYDESK_USER", default_value = "local")]
    pub user: String,

    /// Session id to use (defaults to a new random id)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Collection the document belongs to
    #[arg(long, default_value = "local")]
    pub collection: String,

    /// Override the configured model
    #[arg(long)]
    pub model: Option<String>,
}

enum ControlFlow {
    Continue,
    Exit,
}

/// Run the chat command (REPL).
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    let config = &ctx.loaded.config;
    let retrieval = config.retrieval();

    let source_id = args
        .document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.document.display().to_string());
    let document = DocumentRef::new(args.collection, source_id);

    let retriever = TextDocumentRetriever::new(retrieval.chunk_chars);
    let chunks = retriever.load_file(document.clone(), &args.document)?;
    tracing::info!(document = %document, chunks, "Document loaded");

    let llm = config.llm();
    let mut model_config = OpenAiConfig::default()
        .with_base_url(&llm.base_url)
        .with_model(args.model.unwrap_or(llm.model.clone()))
        .with_timeout(llm.timeout());
    if let Some(key) = llm.resolve_api_key() {
        model_config = model_config.with_api_key(key);
    }
    if let Some(temperature) = llm.temperature {
        model_config = model_config.with_temperature(temperature);
    }
    let model = OpenAiChatModel::new(model_config)?;

    let cache = SessionCache::new(CacheConfig::from_provider(&config.session()));
    let chat = DocumentChat::new(cache, Arc::new(retriever), Arc::new(model))
        .with_top_k(retrieval.top_k);

    let session_id = args.session.unwrap_or_else(new_session_id);
    let mut repl = Repl::new(chat, document, args.user, session_id, ctx.verbose)?;
    repl.run().await
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// REPL state.
struct Repl {
    chat: DocumentChat,
    document: DocumentRef,
    user: String,
    session_id: String,
    editor: Editor<(), DefaultHistory>,
    verbose: bool,
}

impl Repl {
    fn new(
        chat: DocumentChat,
        document: DocumentRef,
        user: String,
        session_id: String,
        verbose: bool,
    ) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();
        let editor = Editor::with_config(config)?;

        Ok(Self {
            chat,
            document,
            user,
            session_id,
            editor,
            verbose,
        })
    }

    async fn run(&mut self) -> Result<()> {
        println!(
            "{} {} ({})",
            style("Chatting with").bold(),
            style(&self.document).cyan(),
            self.chat.model_name()
        );
        println!("{}", style("Type /help for commands, /quit to exit.").dim());

        loop {
            match self.editor.readline("> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        match self.handle_slash_command(line) {
                            ControlFlow::Continue => continue,
                            ControlFlow::Exit => break,
                        }
                    }

                    self.ask(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!();
                    println!("{}", style("(Interrupted - type /quit to exit)").dim());
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    eprintln!("{} {}", style("Input error:").red(), e);
                    break;
                }
            }
        }

        println!("{}", style("Goodbye!").dim());
        Ok(())
    }

    async fn ask(&self, query: &str) {
        let request = DocumentChatRequest {
            session_id: self.session_id.clone(),
            owner_id: self.user.clone(),
            document: self.document.clone(),
            query: query.to_string(),
        };

        match self.chat.turn(&request).await {
            Ok(reply) => {
                println!("{}\n", reply.content);
            }
            Err(e) => {
                eprintln!("{} {}", style("Error:").red(), e);
            }
        }
    }

    fn handle_slash_command(&mut self, input: &str) -> ControlFlow {
        let cmd = input[1..].split_whitespace().next().unwrap_or("");

        match cmd {
            "quit" | "q" | "exit" => return ControlFlow::Exit,
            "new" => {
                // Reusing the owner with a new id purges the old session.
                self.session_id = new_session_id();
                println!("{} {}", style("New session:").dim(), self.session_id);
            }
            "session" => {
                println!("{}", self.session_id);
                if self.verbose {
                    println!("{:?}", self.chat.cache().stats());
                }
            }
            "history" => self.print_history(),
            "help" | "h" | "?" => {
                println!("  /new       start a new session");
                println!("  /history   show the remembered conversation");
                println!("  /session   show the current session id");
                println!("  /quit      exit");
            }
            other => {
                eprintln!("{} /{}", style("Unknown command:").yellow(), other);
            }
        }

        ControlFlow::Continue
    }

    fn print_history(&self) {
        let history = self
            .chat
            .cache()
            .peek_history(&self.session_id)
            .unwrap_or_default();

        if history.is_empty() {
            println!("{}", style("(no history)").dim());
            return;
        }

        for message in history {
            let label = match message.role {
                Role::User => style("you").green(),
                Role::Assistant => style("assistant").cyan(),
                Role::System => style("system").dim(),
            };
            println!("{}: {}", label, message.content);
        }
    }
}
