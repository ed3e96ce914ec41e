//! Fixed reply texts and command matching for the SMS conversation.

/// Inputs recognised as a greeting, compared trimmed and lowercased.
const GREETINGS: [&str; 6] = [
    "ola",
    "olá",
    "oi",
    "oi, tudo bem?",
    "ola, tudo bem?",
    "olá, tudo bem?",
];

pub const WELCOME: &str = "Olá! Bem vindo à nossa empresa! Por favor, digite seu número de contrato.";
pub const CONTRACT_VERIFIED: &str = "Contrato verificado!";
pub const CONTRACT_NOT_FOUND: &str =
    "Contrato não encontrado. Por favor, verifique e digite novamente.";
pub const MAIN_MENU: &str = "Por favor, escolha uma opção:\n1. Ver chamados\n2. Gerar relatório";
pub const INVALID_OPTION: &str = "Opção inválida. Por favor, tente novamente.";
pub const FETCHING_TICKETS: &str = "Por favor, aguarde enquanto obtemos os chamados...";
pub const NO_TICKETS: &str = "Não há chamados registrados.";
pub const ASK_TICKET_NUMBER: &str = "Por favor, digite o número do chamado desejado.";
pub const TICKET_ACCEPTED: &str =
    "Número de chamado verificado!\nPor favor, aguarde enquanto obtemos as atualizações...";
pub const INVALID_TICKET_NUMBER: &str =
    "Número inválido. Por favor, digite um número de chamado válido.";
pub const RETURN_OPTIONS: &str = "Opções: \n1. Retornar ao menu principal\n2. Encerrar a sessão.";
pub const RETURNING_TO_MENU: &str = "Retornando ao menu principal...";
pub const CLOSING_SESSION: &str = "Encerrando a sessão. Obrigado!";
pub const INVALID_RETURN_OPTION: &str =
    "Opção inválida. Por favor, digite 1 para retornar ao menu principal ou 2 para encerrar a sessão.";
pub const NO_REPORT_DATA: &str = "Não há chamados registrados para este contrato.";
pub const SESSION_FINISHED: &str = "Atendimento concluído. Obrigado por usar nossos serviços!";
pub const APOLOGY: &str =
    "Desculpe, ocorreu um erro ao processar sua mensagem. Por favor, tente novamente.";

/// Returns true when the message is one of the known greetings.
pub fn is_greeting(message: &str) -> bool {
    let normalized = message.trim().to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}

/// Matches a numbered menu choice ("1", " 2 ").
pub fn is_choice(message: &str, choice: &str) -> bool {
    message.trim() == choice
}

pub fn ticket_updates(call_number: impl std::fmt::Display, details: &str) -> String {
    format!("Últimas atualizações do chamado {}: {}", call_number, details)
}

pub fn ticket_not_found(call_number: impl std::fmt::Display) -> String {
    format!("Chamado {} não encontrado para este contrato.", call_number)
}

pub fn report_ready(download_url: &str) -> String {
    format!("Relatório gerado com sucesso! Baixe aqui: {}", download_url)
}
