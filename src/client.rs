use crate::{
    bet_form::{
        BetForm,
        BetKind,
        BetRow,
    },
    decoder,
    deployment::Deployment,
    error::ClientError,
    gateway::{
        GatewayError,
        LottoGateway,
        rpc::RpcGateway,
    },
    lucky::{
        describe_picks,
        lucky_picks,
    },
    network::{
        ChainParams,
        ChainWallet,
        RpcWallet,
        ensure_network,
    },
    session::{
        Session,
        WalletSession,
    },
    submission::{
        self,
        SubmissionReport,
        SubmissionStage,
    },
    ui,
    units::format_amount,
};
use alloy::{
    primitives::{
        Address,
        U256,
    },
    signers::local::PrivateKeySigner,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    error,
    info,
    warn,
};

pub const BALANCE_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const MAX_ERRORS: usize = 50;

pub struct AppConfig {
    pub deployment: Deployment,
    pub signer: PrivateKeySigner,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    pub native: U256,
    pub token: U256,
    pub pool: U256,
}

impl Balances {
    pub fn native_display(&self) -> String {
        format_amount(self.native, 4)
    }

    pub fn token_display(&self) -> String {
        format_amount(self.token, 6)
    }

    pub fn pool_display(&self) -> String {
        format_amount(self.pool, 2)
    }
}

/// The "last bet" panel, rendered from a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastBetView {
    pub bets: String,
    pub total: String,
    pub result: String,
    pub outcome: Option<&'static str>,
}

impl From<&SubmissionReport> for LastBetView {
    fn from(report: &SubmissionReport) -> Self {
        Self {
            bets: report.bets_line(),
            total: report.total_line(),
            result: report.outcome.result_line(),
            outcome: report.outcome.label(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub address: String,
    pub network: String,
    pub balances: Option<Balances>,
    pub constants: String,
    pub constants_live: bool,
    pub kind: BetKind,
    pub rows: Vec<BetRow>,
    pub total_stake: String,
    pub last_bet: Option<LastBetView>,
    pub lucky: Option<String>,
    pub decoded: Option<String>,
    pub submitting: bool,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController<G, W> {
    gateway: G,
    wallet: W,
    chain: ChainParams,
    session: Session,
    form: BetForm,
    kind: BetKind,
    balances: Option<Balances>,
    last_bet: Option<LastBetView>,
    lucky: Option<String>,
    decoded: Option<String>,
    status: String,
    errors: Vec<String>,
}

/// Native balance, FROLL balance and pool balance in one read.
pub async fn fetch_balances<G: LottoGateway>(
    gateway: &G,
    owner: Address,
) -> Result<Balances, GatewayError> {
    let (native, token, pool) = tokio::try_join!(
        gateway.native_balance(owner),
        gateway.token_balance(owner),
        gateway.pool_balance(),
    )?;
    Ok(Balances {
        native,
        token,
        pool,
    })
}

async fn open_session<G: LottoGateway, W: ChainWallet>(
    gateway: &G,
    wallet: &mut W,
    chain: &ChainParams,
    address: Address,
) -> Result<Session, ClientError> {
    ensure_network(Some(&mut *wallet), chain).await?;
    let chain_id = wallet.chain_id().await?;
    let mut session = Session::new(WalletSession { address, chain_id });
    session.refresh_constants(gateway).await;
    info!(%address, chain_id, "Wallet connected.");
    Ok(session)
}

impl<G: LottoGateway, W: ChainWallet> AppController<G, W> {
    /// Puts `wallet` on `chain` and reads the payout constants.
    pub async fn connect(
        gateway: G,
        mut wallet: W,
        chain: ChainParams,
        address: Address,
    ) -> Result<Self, ClientError> {
        let session = open_session(&gateway, &mut wallet, &chain, address).await?;
        Ok(Self {
            gateway,
            wallet,
            chain,
            session,
            form: BetForm::new(),
            kind: BetKind::default(),
            balances: None,
            last_bet: None,
            lucky: None,
            decoded: None,
            status: String::from("Wallet connected."),
            errors: Vec::new(),
        })
    }

    /// Re-checks the network and starts a fresh session; the last bet survives.
    pub async fn reconnect(&mut self) -> Result<(), ClientError> {
        let address = self.session.wallet().address;
        let last_bet = self.session.last_bet().cloned();
        let mut session =
            open_session(&self.gateway, &mut self.wallet, &self.chain, address).await?;
        if let Some(bet) = last_bet {
            session.record_submission(bet);
        }
        self.session = session;
        self.set_status("Wallet reconnected.");
        Ok(())
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn form(&self) -> &BetForm {
        &self.form
    }

    pub fn kind(&self) -> BetKind {
        self.kind
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.errors.clear();
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }

    pub fn toggle_kind(&mut self) {
        self.kind = self.kind.toggled();
        self.set_status(format!("Bet type: {}", self.kind));
    }

    pub fn apply_form_action(&mut self, action: ui::FormAction) {
        match action {
            ui::FormAction::Push { row, field, ch } => {
                if let Some(cell) = self.form.row_mut(row) {
                    let text = match field {
                        ui::Field::Number => &mut cell.number,
                        ui::Field::Stake => &mut cell.stake,
                    };
                    if ui::accepts_more(field, text) {
                        text.push(ch);
                    }
                }
            }
            ui::FormAction::Pop { row, field } => {
                if let Some(cell) = self.form.row_mut(row) {
                    match field {
                        ui::Field::Number => cell.number.pop(),
                        ui::Field::Stake => cell.stake.pop(),
                    };
                }
            }
            ui::FormAction::AddRow => {
                if let Err(err) = self.form.add_row() {
                    self.push_errors(vec![err.to_string()]);
                }
            }
            ui::FormAction::RemoveRow(row) => {
                self.form.remove_row(row);
            }
            ui::FormAction::ClearRow(row) => self.form.clear_row(row),
            ui::FormAction::Repeat => match self.session.last_bet() {
                Some(bet) => {
                    let bet = bet.clone();
                    self.form.repeat(&bet);
                    self.set_status("Loaded your last bet.");
                }
                None => self.push_errors(vec!["No previous bet to repeat.".to_string()]),
            },
            ui::FormAction::Double => self.form.double_stakes(),
            ui::FormAction::Halve => self.form.halve_stakes(),
        }
    }

    /// Runs the submission flow for the current form. `on_stage` sees every
    /// stage as it happens.
    pub async fn place_bet(
        &mut self,
        mut on_stage: impl FnMut(&SubmissionStage),
    ) -> Result<SubmissionReport, ClientError> {
        let owner = self.session.wallet().address;
        let constants = *self.session.constants().value();
        let mut sent = None;
        let result = submission::submit_bet(
            &self.gateway,
            owner,
            &self.form,
            self.kind,
            &constants,
            |stage| {
                if let SubmissionStage::Submitted { bet, .. } = stage {
                    sent = Some(bet.clone());
                }
                on_stage(stage);
            },
        )
        .await;

        if let Some(bet) = sent {
            self.session.record_submission(bet);
        }
        match result {
            Ok(report) => {
                self.last_bet = Some(LastBetView::from(&report));
                self.set_status(format!(
                    "Bet confirmed. Tx: {}",
                    self.chain.tx_url(report.bet.tx_hash)
                ));
                Ok(report)
            }
            Err(err) => {
                self.push_errors(vec![err.user_message()]);
                Err(err)
            }
        }
    }

    pub async fn decode(&mut self, input: &str) {
        let output = match decoder::decode_input(&self.gateway, &self.chain.explorer_url, input)
            .await
        {
            Ok(report) => report.render(),
            Err(err) => {
                warn!(%err, "decode failed");
                err.to_string()
            }
        };
        self.decoded = Some(output);
    }

    pub fn lucky(&mut self, count: usize) {
        let picks = lucky_picks(&mut rand::rng(), count);
        self.lucky = Some(describe_picks(&picks));
    }

    pub fn apply_balances(&mut self, balances: Result<Balances, String>) {
        match balances {
            Ok(balances) => self.balances = Some(balances),
            Err(err) => {
                warn!(%err, "balance refresh failed");
                self.push_errors(vec!["Failed to refresh balances.".to_string()]);
            }
        }
    }

    pub fn build_snapshot(&self) -> AppSnapshot {
        let constants = self.session.constants();
        AppSnapshot {
            address: self.session.wallet().address.to_string(),
            network: format!("{} ({})", self.chain.name, self.session.wallet().chain_id),
            balances: self.balances,
            constants: constants.value().describe(),
            constants_live: constants.is_live(),
            kind: self.kind,
            rows: self.form.rows().to_vec(),
            total_stake: format_amount(self.form.total_stake(), 6),
            last_bet: self.last_bet.clone(),
            lucky: self.lucky.clone(),
            decoded: self.decoded.clone(),
            submitting: false,
            status: self.status.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Warns when the lottery's deployed code does not match the pinned hash.
async fn check_pinned_bytecode(gateway: &RpcGateway, deployment: &Deployment) {
    let Some(pinned) = &deployment.bytecode_hash else {
        return;
    };
    match gateway.deployed_code(deployment.lotto).await {
        Ok(code) => {
            let actual = crate::deployment::compute_bytecode_hash(&code);
            if pinned.eq_ignore_ascii_case(&actual) {
                info!(lotto = %deployment.lotto, "deployed bytecode matches pinned hash");
            } else {
                warn!(
                    lotto = %deployment.lotto,
                    expected = %pinned,
                    %actual,
                    "deployed lottery bytecode differs from the pinned hash"
                );
            }
        }
        Err(err) => warn!(%err, "could not read deployed lottery bytecode"),
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let AppConfig { deployment, signer } = config;
    let address = signer.address();
    let rpc_url = deployment.chain.rpc_url.clone();
    let gateway =
        RpcGateway::with_signer(rpc_url.clone(), signer, deployment.token, deployment.lotto);
    check_pinned_bytecode(&gateway, &deployment).await;

    let wallet = RpcWallet::connect(rpc_url);
    let controller = AppController::connect(gateway, wallet, deployment.chain, address)
        .await
        .wrap_err("Error connecting to wallet. Please ensure the RPC is reachable and on Viction.")?;

    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

enum BalanceWorkerCommand {
    FetchNow,
    Shutdown,
}

enum BalanceWorkerEvent {
    Balances(Result<Balances, String>),
}

async fn balance_worker<G>(
    poll_interval: Duration,
    gateway: G,
    owner: Address,
    mut cmd_rx: mpsc::UnboundedReceiver<BalanceWorkerCommand>,
    event_tx: mpsc::UnboundedSender<BalanceWorkerEvent>,
) -> Result<()>
where
    G: LottoGateway + Send + Sync,
{
    async fn fetch<G: LottoGateway>(
        gateway: &G,
        owner: Address,
        event_tx: &mpsc::UnboundedSender<BalanceWorkerEvent>,
    ) -> Result<()> {
        let balances = fetch_balances(gateway, owner)
            .await
            .map_err(|err| err.to_string());
        event_tx
            .send(BalanceWorkerEvent::Balances(balances))
            .map_err(|_| eyre!("balance receiver dropped"))
    }

    let mut ticker = time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                fetch(&gateway, owner, &event_tx).await?;
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                match cmd {
                    BalanceWorkerCommand::FetchNow => fetch(&gateway, owner, &event_tx).await?,
                    BalanceWorkerCommand::Shutdown => break,
                }
            }
        }
    }
    Ok(())
}

fn redraw(ui_state: &mut ui::UiState, snapshot: &AppSnapshot, context: &'static str) -> Result<()> {
    ui::draw(ui_state, snapshot).wrap_err(context)
}

async fn run_loop<G, W>(
    mut controller: AppController<G, W>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()>
where
    G: LottoGateway + Clone + Send + Sync + 'static,
    W: ChainWallet,
{
    tracing::info!("Running app loop");
    let owner = controller.session().wallet().address;
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(balance_worker(
        BALANCE_REFRESH_INTERVAL,
        controller.gateway().clone(),
        owner,
        cmd_rx,
        event_tx,
    ));

    redraw(ui_state, &controller.build_snapshot(), "initial draw failed")?;

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(BalanceWorkerEvent::Balances(balances)) => {
                        controller.apply_balances(balances);
                        redraw(ui_state, &controller.build_snapshot(), "draw after balance refresh failed")?;
                    }
                    None => {
                        warn!("balance worker channel closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = cmd_tx.send(BalanceWorkerCommand::Shutdown);
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => {
                        let _ = cmd_tx.send(BalanceWorkerCommand::Shutdown);
                        break;
                    }
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::Form(action) => controller.apply_form_action(action),
                    ui::UserEvent::ToggleKind => controller.toggle_kind(),
                    ui::UserEvent::RefreshBalances => {
                        let _ = cmd_tx.send(BalanceWorkerCommand::FetchNow);
                    }
                    ui::UserEvent::Reconnect => {
                        if let Err(err) = controller.reconnect().await {
                            controller.push_errors(vec![err.user_message()]);
                        }
                        let _ = cmd_tx.send(BalanceWorkerCommand::FetchNow);
                    }
                    ui::UserEvent::Lucky(count) => controller.lucky(count),
                    ui::UserEvent::Decode(input) => controller.decode(&input).await,
                    ui::UserEvent::PlaceBet => {
                        let mut progress = controller.build_snapshot();
                        progress.submitting = true;
                        let result = controller
                            .place_bet(|stage| {
                                progress.status = stage.describe();
                                if let Err(err) = ui::draw(ui_state, &progress) {
                                    warn!(?err, "draw during submission failed");
                                }
                            })
                            .await;
                        let dropped = ui::discard_queued_input(input_events);
                        if dropped > 0 {
                            info!(dropped, "discarded input received while submitting");
                        }
                        if result.is_ok() {
                            let _ = cmd_tx.send(BalanceWorkerCommand::FetchNow);
                        }
                    }
                }
                redraw(ui_state, &controller.build_snapshot(), "draw after input failed")?;
            }
        }
    }

    match worker.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.wrap_err("balance worker failed")),
        Err(join) => Err(eyre!("balance worker panicked: {join}")),
    }
}
