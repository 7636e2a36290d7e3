// src/schema/tables.rs

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

use super::types::FieldType;
use super::types::FieldType::{Date, Float, Str};

/// Declared schema for one logical target table.
///
/// Raw files are headerless and positional, so the order of `fields` is
/// significant: the Nth declared column must match the Nth raw column.
#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub fields: &'static [(&'static str, FieldType)],
}

impl TableSchema {
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.fields.iter().position(|(name, _)| *name == column)
    }
}

/// The registry's target tables: four entity tables plus six reference
/// (code/description) lookups.
static TABLES: &[TableSchema] = &[
    TableSchema {
        name: "empresa",
        fields: &[
            ("cnpj_basico", Str),
            ("razao_social", Str),
            ("cod_natureza_juridica", Str),
            ("cod_qualificacao_do_responsavel", Str),
            ("capital_social", Float),
            ("cod_porte", Str),
            ("ente_federativo_responsavel", Str),
        ],
    },
    TableSchema {
        name: "estabelecimento",
        fields: &[
            ("cnpj_basico", Str),
            ("cnpj_ordem", Str),
            ("cnpj_dv", Str),
            ("cod_id_matriz_filial", Str),
            ("nome_fantasia", Str),
            ("cod_situacao_cadastral", Str),
            ("data_situacao_cadastral", Date),
            ("cod_motivo_situacao_cadastral", Str),
            ("nome_cidade_exterior", Str),
            ("cod_pais", Str),
            ("data_inicio_atividade", Date),
            ("cod_cnae_fiscal", Str),
            ("cod_cnae_fiscal_secundario", Str),
            ("tipo_logradouro", Str),
            ("logradouro", Str),
            ("numero", Str),
            ("complemento", Str),
            ("bairro", Str),
            ("cep", Str),
            ("uf", Str),
            ("cod_municipio", Str),
            ("ddd_1", Str),
            ("telefone_1", Str),
            ("ddd_2", Str),
            ("telefone_2", Str),
            ("ddd_fax", Str),
            ("telefone_fax", Str),
            ("correio_eletronico", Str),
            ("situacao_especial", Str),
            ("data_situacao_especial", Date),
        ],
    },
    TableSchema {
        name: "simples",
        fields: &[
            ("cnpj_basico", Str),
            ("opcao_pelo_simples", Str),
            ("data_opcao_pelo_simples", Date),
            ("data_exclusao_pelo_simples", Date),
            ("opcao_pelo_mei", Str),
            ("data_opcao_pelo_mei", Date),
            ("data_exclusao_pelo_mei", Date),
        ],
    },
    TableSchema {
        name: "socio",
        fields: &[
            ("cnpj_basico", Str),
            ("cod_id_socio", Str),
            ("razao_social", Str),
            ("cnpj_cpf_socio", Str),
            ("cod_qualificacao_socio", Str),
            ("data_entrada_sociedade", Date),
            ("cod_pais_socio_estrangeiro", Str),
            ("numero_cpf_representante_legal", Str),
            ("nome_representante_legal", Str),
            ("cod_qualificacao_representante_legal", Str),
            ("cod_faixa_etaria", Str),
        ],
    },
    TableSchema {
        name: "pais",
        fields: &[("codigo", Str), ("descricao", Str)],
    },
    TableSchema {
        name: "municipio",
        fields: &[("codigo", Str), ("descricao", Str)],
    },
    TableSchema {
        name: "qualificacao_socio",
        fields: &[("codigo", Str), ("descricao", Str)],
    },
    TableSchema {
        name: "natureza_juridica",
        fields: &[("codigo", Str), ("descricao", Str)],
    },
    TableSchema {
        name: "cnae",
        fields: &[("codigo", Str), ("descricao", Str)],
    },
    TableSchema {
        name: "motivo",
        fields: &[("codigo", Str), ("descricao", Str)],
    },
];

/// Raw filename prefix → table name. Checked in order, first match wins;
/// prefixes are literal (not patterns), so more specific prefixes must come
/// before any overlapping shorter one.
static PREFIX_TABLE: &[(&str, &str)] = &[
    ("empre", "empresa"),
    ("estabele", "estabelecimento"),
    ("simples", "simples"),
    ("socio", "socio"),
    ("pais", "pais"),
    ("munic", "municipio"),
    ("quals", "qualificacao_socio"),
    ("natju", "natureza_juridica"),
    ("cnae", "cnae"),
    ("moti", "motivo"),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static TableSchema>> =
    Lazy::new(|| TABLES.iter().map(|t| (t.name, t)).collect());

/// Look up a declared schema by table name.
pub fn table_schema(name: &str) -> Option<&'static TableSchema> {
    BY_NAME.get(name).copied()
}

/// Map a raw file path to its target table, by lower-cased filename prefix.
///
/// Pure; returns `None` when nothing matches so callers can skip the file.
pub fn resolve_table(path: &Path) -> Option<&'static TableSchema> {
    let file_name = path.file_name()?.to_string_lossy().to_lowercase();
    PREFIX_TABLE
        .iter()
        .find(|(prefix, _)| file_name.starts_with(prefix))
        .and_then(|(_, table)| table_schema(table))
}
