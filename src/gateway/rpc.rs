use super::{
    Confirmation,
    GatewayError,
    LogRecord,
    LottoGateway,
    PendingTransaction,
    TxOverrides,
};
use crate::{
    bet_form::BetKind,
    fees::{
        FeeQuote,
        FeeSnapshot,
    },
    session::{
        PayoutConstants,
        Sourced,
    },
};
use alloy::{
    network::{
        Ethereum,
        EthereumWallet,
        ReceiptResponse,
        TransactionBuilder,
    },
    primitives::{
        Address,
        Bytes,
        TxHash,
        U256,
    },
    providers::{
        DynProvider,
        PendingTransactionBuilder,
        Provider,
        ProviderBuilder,
    },
    rpc::types::{
        TransactionReceipt,
        TransactionRequest,
    },
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
    transports::TransportError,
};
use lotto_abi::{
    IFroll,
    ILotto,
};
use tracing::{
    debug,
    info,
};
use url::Url;

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;

pub struct RpcPending {
    inner: PendingTransactionBuilder<Ethereum>,
}

impl PendingTransaction for RpcPending {
    fn tx_hash(&self) -> TxHash {
        *self.inner.tx_hash()
    }
}

/// Gateway over a JSON-RPC endpoint. Writes are signed locally when a signer
/// is attached.
#[derive(Clone)]
pub struct RpcGateway {
    provider: DynProvider,
    sender: Option<Address>,
    token: Address,
    lotto: Address,
}

impl RpcGateway {
    pub fn read_only(rpc_url: Url, token: Address, lotto: Address) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Self {
            provider,
            sender: None,
            token,
            lotto,
        }
    }

    pub fn with_signer(
        rpc_url: Url,
        signer: PrivateKeySigner,
        token: Address,
        lotto: Address,
    ) -> Self {
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();
        Self {
            provider,
            sender: Some(sender),
            token,
            lotto,
        }
    }

    pub fn sender(&self) -> Option<Address> {
        self.sender
    }

    pub async fn chain_id(&self) -> Result<u64, GatewayError> {
        self.provider.get_chain_id().await.map_err(unavailable)
    }

    pub async fn deployed_code(&self, address: Address) -> Result<Bytes, GatewayError> {
        self.provider.get_code_at(address).await.map_err(unavailable)
    }

    async fn view<C: SolCall + Send>(
        &self,
        to: Address,
        call: C,
    ) -> Result<C::Return, GatewayError> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(call.abi_encode());
        let output = self.provider.call(tx).await.map_err(unavailable)?;
        C::abi_decode_returns(&output).map_err(|err| {
            GatewayError::RpcUnavailable(format!("undecodable {} result: {err}", C::SIGNATURE))
        })
    }

    fn write_request(&self, to: Address, input: Vec<u8>) -> TransactionRequest {
        let tx = TransactionRequest::default().with_to(to).with_input(input);
        match self.sender {
            Some(from) => tx.with_from(from),
            None => tx,
        }
    }

    async fn send(&self, tx: TransactionRequest) -> Result<RpcPending, GatewayError> {
        let inner = self.provider.send_transaction(tx).await.map_err(classify)?;
        info!(tx_hash = %inner.tx_hash(), "transaction sent");
        Ok(RpcPending { inner })
    }
}

fn bet_call_data(kind: BetKind, numbers: &[u8], stakes: &[U256]) -> Vec<u8> {
    match kind {
        BetKind::MultiDraw => ILotto::betLoCall {
            numbers: numbers.to_vec(),
            stakes: stakes.to_vec(),
        }
        .abi_encode(),
        BetKind::SingleDraw => ILotto::betDeCall {
            numbers: numbers.to_vec(),
            stakes: stakes.to_vec(),
        }
        .abi_encode(),
    }
}

fn with_fee(tx: TransactionRequest, fee: Option<FeeQuote>) -> TransactionRequest {
    match fee {
        Some(FeeQuote::Dynamic {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }) => tx
            .with_max_fee_per_gas(max_fee_per_gas)
            .with_max_priority_fee_per_gas(max_priority_fee_per_gas),
        Some(FeeQuote::Legacy { gas_price }) => tx.with_gas_price(gas_price),
        None => tx,
    }
}

fn with_overrides(tx: TransactionRequest, overrides: TxOverrides) -> TransactionRequest {
    let tx = with_fee(tx, overrides.fee);
    match overrides.gas_limit {
        Some(limit) => tx.with_gas_limit(limit),
        None => tx,
    }
}

fn unavailable(err: TransportError) -> GatewayError {
    GatewayError::RpcUnavailable(err.to_string())
}

/// Sorts a node error into rejection, revert (with payload when the node
/// returned one) or plain RPC failure.
fn classify(err: TransportError) -> GatewayError {
    if let Some(payload) = err.as_error_resp() {
        if payload.code == USER_REJECTED_CODE {
            return GatewayError::UserRejected;
        }
        if let Some(data) = payload.as_revert_data() {
            return GatewayError::Reverted {
                data: Some(data),
                message: payload.message.to_string(),
            };
        }
        if payload.message.contains("revert") {
            return GatewayError::Reverted {
                data: None,
                message: payload.message.to_string(),
            };
        }
        return GatewayError::Rpc(payload.message.to_string());
    }
    if err.is_transport_error() {
        return GatewayError::RpcUnavailable(err.to_string());
    }
    GatewayError::Rpc(err.to_string())
}

fn confirmation_from(receipt: &TransactionReceipt) -> Confirmation {
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| LogRecord {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        })
        .collect();
    Confirmation {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        logs,
    }
}

impl LottoGateway for RpcGateway {
    type Pending = RpcPending;

    fn token_address(&self) -> Address {
        self.token
    }

    fn lotto_address(&self) -> Address {
        self.lotto
    }

    async fn min_stake(&self) -> Result<U256, GatewayError> {
        self.view(self.lotto, ILotto::minBetCall {}).await
    }

    async fn pool_balance(&self) -> Result<U256, GatewayError> {
        self.view(self.token, IFroll::balanceOfCall { owner: self.lotto })
            .await
    }

    async fn payout_constants(&self) -> Sourced<PayoutConstants> {
        let defaults = PayoutConstants::default();
        let minimum_stake = match self.min_stake().await {
            Ok(value) => value,
            Err(err) => {
                return Sourced::Default {
                    value: defaults,
                    reason: format!("minBet unavailable: {err}"),
                };
            }
        };

        let mut fallbacks = Vec::new();
        let draw_count = match self.view(self.lotto, ILotto::LO_DRAWSCall {}).await {
            Ok(value) => value,
            Err(err) => {
                fallbacks.push(format!("LO_DRAWS: {err}"));
                defaults.draw_count
            }
        };
        let multi_draw_multiplier =
            match self.view(self.lotto, ILotto::LO_PAYOUT_XCall {}).await {
                Ok(value) => value,
                Err(err) => {
                    fallbacks.push(format!("LO_PAYOUT_X: {err}"));
                    defaults.multi_draw_multiplier
                }
            };
        let single_draw_multiplier =
            match self.view(self.lotto, ILotto::DE_PAYOUT_XCall {}).await {
                Ok(value) => value,
                Err(err) => {
                    fallbacks.push(format!("DE_PAYOUT_X: {err}"));
                    defaults.single_draw_multiplier
                }
            };

        let value = PayoutConstants {
            draw_count,
            multi_draw_multiplier,
            single_draw_multiplier,
            minimum_stake,
        };
        if fallbacks.is_empty() {
            Sourced::Live(value)
        } else {
            Sourced::Default {
                value,
                reason: fallbacks.join("; "),
            }
        }
    }

    async fn token_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.view(self.token, IFroll::balanceOfCall { owner }).await
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.provider.get_balance(owner).await.map_err(unavailable)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, GatewayError> {
        self.view(self.token, IFroll::allowanceCall { owner, spender })
            .await
    }

    async fn approve(
        &self,
        spender: Address,
        amount: U256,
        fee: FeeQuote,
    ) -> Result<RpcPending, GatewayError> {
        let input = IFroll::approveCall { spender, amount }.abi_encode();
        let tx = with_fee(self.write_request(self.token, input), Some(fee));
        self.send(tx).await
    }

    async fn estimate_bet_gas(
        &self,
        kind: BetKind,
        numbers: &[u8],
        stakes: &[U256],
        fee: Option<FeeQuote>,
    ) -> Result<u64, GatewayError> {
        let input = bet_call_data(kind, numbers, stakes);
        let tx = with_fee(self.write_request(self.lotto, input), fee);
        self.provider.estimate_gas(tx).await.map_err(classify)
    }

    async fn submit_bet(
        &self,
        kind: BetKind,
        numbers: &[u8],
        stakes: &[U256],
        overrides: TxOverrides,
    ) -> Result<RpcPending, GatewayError> {
        let input = bet_call_data(kind, numbers, stakes);
        let tx = with_overrides(self.write_request(self.lotto, input), overrides);
        self.send(tx).await
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, GatewayError> {
        match self.provider.estimate_eip1559_fees().await {
            Ok(estimate) => Ok(FeeSnapshot {
                max_fee_per_gas: Some(estimate.max_fee_per_gas),
                max_priority_fee_per_gas: Some(estimate.max_priority_fee_per_gas),
                gas_price: None,
            }),
            Err(err) => {
                debug!(%err, "no dynamic fee data, reading gas price");
                let gas_price = self.provider.get_gas_price().await.map_err(unavailable)?;
                Ok(FeeSnapshot {
                    gas_price: Some(gas_price),
                    ..FeeSnapshot::default()
                })
            }
        }
    }

    async fn confirm(&self, pending: RpcPending) -> Result<Confirmation, GatewayError> {
        let tx_hash = *pending.inner.tx_hash();
        let receipt = pending
            .inner
            .get_receipt()
            .await
            .map_err(|err| GatewayError::Rpc(format!("waiting for {tx_hash}: {err}")))?;
        if !receipt.status() {
            return Err(GatewayError::Reverted {
                data: None,
                message: format!("Transaction {tx_hash} reverted on-chain."),
            });
        }
        Ok(confirmation_from(&receipt))
    }

    async fn receipt_by_hash(&self, hash: TxHash) -> Result<Option<Confirmation>, GatewayError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(unavailable)?;
        Ok(receipt.as_ref().map(confirmation_from))
    }
}
