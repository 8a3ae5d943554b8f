use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ErgTx {
    pub id: String,
    #[serde(rename = "inclusionHeight")]
    pub inclusion_height: u64,
    pub outputs: Vec<ErgTxOutput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErgTxOutput {
    #[serde(rename = "boxId")]
    pub box_id: String,
    #[serde(rename = "additionalRegisters")]
    pub additional_registers: Registers,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registers {
    pub r4: Option<RenderedRegister>,
    pub r5: Option<RenderedRegister>,
    pub r6: Option<RenderedRegister>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderedRegister {
    #[serde(rename = "renderedValue")]
    pub rendered_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "tokenId")]
    pub token_id: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErgUtxoBox {
    #[serde(rename = "boxId")]
    pub box_id: String,
    pub assets: Vec<Asset>,
    #[serde(rename = "additionalRegisters")]
    pub additional_registers: Registers,
    #[serde(rename = "ergoTree")]
    pub ergo_tree: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultTxRequest {
    pub address: String,
    pub value: u64,
    pub assets: Vec<Asset>,
    pub registers: ResultTxRegisters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultTxRegisters {
    #[serde(rename = "R4")]
    pub r4: String,
    #[serde(rename = "R5")]
    pub r5: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultTxBody {
    pub requests: Vec<ResultTxRequest>,
    pub fee: u64,
    #[serde(rename = "inputsRaw")]
    pub inputs_raw: Vec<String>,
    #[serde(rename = "dataInputsRaw")]
    pub data_inputs_raw: Vec<String>,
}

pub const MINER_FEE: u64 = 1_000_000;
pub const MIN_BOX_VALUE: u64 = 1_000_000;
