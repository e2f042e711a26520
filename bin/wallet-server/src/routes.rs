use core::str::FromStr;

use std::iter;

use alloy_primitives::U256;
use axum::{Json, extract::State, http::StatusCode};
use itertools::Itertools;
use multisig_wallet_domain::{
    address::parse_address,
    call::{CallRequest, ContractCall, ViewCall},
    dashboard::TxTab,
    owners::{OwnerError, OwnerList},
    request::{WalletCreationRequest, WalletField, WalletForm, WalletFormUpdate},
    screen::{ScreenAction, Transition, TransitionError, View},
    tx::{TransactionForm, TxKind},
};
use multisig_wallet_engine::{Connection, DispatchEngineError};
use uuid::Uuid;

use crate::{
    App, SessionStore,
    error::AppError,
    payload::{
        DispatchPayload, FieldErrorPayload, SessionPayload, TxRecordPayload, WalletRequestPayload,
        request::{
            AddSessionOwnersRequestPayload, AddSessionOwnersRequestPayloadDissolved,
            ApplySessionActionRequestPayload, ApplySessionActionRequestPayloadDissolved,
            GetDispatchStatusRequestPayload, GetDispatchStatusRequestPayloadDissolved,
            GetSessionDetailsRequestPayload, GetSessionDetailsRequestPayloadDissolved,
            GetWalletDetailsRequestPayload, GetWalletDetailsRequestPayloadDissolved,
            ListWalletTxRequestPayload, ListWalletTxRequestPayloadDissolved,
            RemoveSessionOwnerRequestPayload, RemoveSessionOwnerRequestPayloadDissolved,
            ResolveRouteRequestPayload, ResolveRouteRequestPayloadDissolved,
            SetCounterNumberRequestPayload, SetCounterNumberRequestPayloadDissolved,
            SubmitWalletTxRequestPayload, SubmitWalletTxRequestPayloadDissolved,
            UpdateSessionFormRequestPayload, UpdateSessionFormRequestPayloadDissolved,
            ValidateWalletRequestPayload, ValidateWalletRequestPayloadDissolved,
        },
        response::{
            ApplySessionActionResponsePayload, DispatchResponsePayload,
            GetCounterNumberResponsePayload, GetWalletDetailsResponsePayload,
            ListWalletTxResponsePayload, ResolveRouteResponsePayload, SessionResponsePayload,
            ValidateWalletResponsePayload,
        },
    },
    session::Session,
};

#[tracing::instrument]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

#[tracing::instrument(skip_all)]
pub async fn resolve_route(
    Json(payload): Json<ResolveRouteRequestPayload>,
) -> Json<ResolveRouteResponsePayload> {
    let ResolveRouteRequestPayloadDissolved { path } = payload.dissolve();

    let response = match View::resolve(path.as_deref().unwrap_or_default()) {
        View::Onboarding => ResolveRouteResponsePayload::builder().view("onboarding").build(),
        View::Dashboard(address) => ResolveRouteResponsePayload::builder()
            .view("dashboard")
            .wallet_address(address)
            .build(),
    };

    Json(response)
}

#[tracing::instrument(skip_all)]
pub async fn validate_wallet(
    Json(payload): Json<ValidateWalletRequestPayload>,
) -> Json<ValidateWalletResponsePayload> {
    let ValidateWalletRequestPayloadDissolved {
        owners,
        minimum_threshold,
        initial_approvals,
        initial_votes,
        name,
    } = payload.dissolve();

    let mut owner_list = OwnerList::new();
    let owner_error = match owner_list.add(&owners) {
        Ok(_) | Err(OwnerError::Empty) => None,
        Err(err) => Some(FieldErrorPayload::new(WalletField::Owners, err)),
    };

    let result = WalletCreationRequest::builder()
        .owners(owner_list.into())
        .minimum_threshold(minimum_threshold)
        .initial_approvals(initial_approvals)
        .initial_votes(initial_votes)
        .name(name)
        .build();

    let errors = match (&result, owner_error) {
        (Ok(_), None) => Vec::new(),
        (Ok(_), Some(owner_error)) => vec![owner_error],
        (Err(errors), None) => FieldErrorPayload::from_errors(errors),
        (Err(errors), Some(owner_error)) => iter::once(owner_error)
            .chain(
                FieldErrorPayload::from_errors(errors)
                    .into_iter()
                    .filter(|error| !error.is_for(WalletField::Owners)),
            )
            .collect(),
    };

    let request = result
        .ok()
        .filter(|_| errors.is_empty())
        .map(|request| WalletRequestPayload::from(&request));

    let response = ValidateWalletResponsePayload::builder()
        .valid(request.is_some())
        .errors(errors)
        .maybe_request(request)
        .build();

    Json(response)
}

#[tracing::instrument(skip_all)]
pub async fn create_session<C>(State(app): State<App<C>>) -> Json<SessionResponsePayload>
where
    C: Connection,
{
    let App { sessions, .. } = app;

    let session = sessions.create(SessionPayload::new).await;

    Json(SessionResponsePayload::builder().session(session).build())
}

#[tracing::instrument(skip_all)]
pub async fn get_session_details<C>(
    State(app): State<App<C>>,
    Json(payload): Json<GetSessionDetailsRequestPayload>,
) -> Result<Json<SessionResponsePayload>, AppError>
where
    C: Connection,
{
    let App { sessions, .. } = app;

    let GetSessionDetailsRequestPayloadDissolved { session_id } = payload.dissolve();

    let session = session_payload(&sessions, session_id).await?;

    Ok(Json(SessionResponsePayload::builder().session(session).build()))
}

#[tracing::instrument(skip_all)]
pub async fn apply_session_action<C>(
    State(app): State<App<C>>,
    Json(payload): Json<ApplySessionActionRequestPayload>,
) -> Result<Json<ApplySessionActionResponsePayload>, AppError>
where
    C: Connection,
{
    let App { engine, sessions, factory_address, navigation_delay, .. } = app;

    let ApplySessionActionRequestPayloadDissolved { session_id, action } = payload.dissolve();

    let action = ScreenAction::from(action);
    let action_name = <&'static str>::from(&action);

    let transition = sessions
        .update(session_id, |session| {
            let transition = session.onboarding_mut().apply(action)?;

            if let Transition::OpenWallet(wallet) = transition {
                session.open_wallet(wallet);
            }

            Ok::<_, TransitionError>(transition)
        })
        .await
        .ok_or(AppError::SessionNotFound)?
        .inspect_err(|e| tracing::warn!(%session_id, action = action_name, "action rejected: {e}"))?;

    let transition_name = match transition {
        Transition::Moved(screen) => {
            tracing::info!(%session_id, action = action_name, %screen, "session moved");
            "moved"
        },
        Transition::OpenWallet(wallet) => {
            tracing::info!(%session_id, %wallet, "session opened wallet");
            "open_wallet"
        },
        Transition::Deploy(request) => {
            let call = CallRequest::builder().target(factory_address).call(request).build();

            let dispatch = engine
                .dispatch(call)
                .await
                .inspect_err(|e| tracing::error!("failed to dispatch wallet creation: {e}"))?;

            sessions.navigate_on_creation(session_id, dispatch.clone(), navigation_delay);

            sessions
                .update(session_id, |session| session.set_dispatch(dispatch))
                .await
                .ok_or(AppError::SessionNotFound)?;

            "deploy"
        },
    };

    let session = session_payload(&sessions, session_id).await?;

    let response = ApplySessionActionResponsePayload::builder()
        .transition(transition_name)
        .session(session)
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn add_session_owners<C>(
    State(app): State<App<C>>,
    Json(payload): Json<AddSessionOwnersRequestPayload>,
) -> Result<Json<SessionResponsePayload>, AppError>
where
    C: Connection,
{
    let App { sessions, .. } = app;

    let AddSessionOwnersRequestPayloadDissolved { session_id, input } = payload.dissolve();

    sessions
        .update(session_id, |session| {
            edit_form(session, |form| form.add_owners(&input).map(|_| ()).map_err(AppError::from))
        })
        .await
        .ok_or(AppError::SessionNotFound)??;

    let session = session_payload(&sessions, session_id).await?;

    Ok(Json(SessionResponsePayload::builder().session(session).build()))
}

#[tracing::instrument(skip_all)]
pub async fn remove_session_owner<C>(
    State(app): State<App<C>>,
    Json(payload): Json<RemoveSessionOwnerRequestPayload>,
) -> Result<Json<SessionResponsePayload>, AppError>
where
    C: Connection,
{
    let App { sessions, .. } = app;

    let RemoveSessionOwnerRequestPayloadDissolved { session_id, owner } = payload.dissolve();

    let owner = parse_address(owner.trim())?;

    let removed = sessions
        .update(session_id, |session| edit_form(session, |form| Ok(form.remove_owner(&owner))))
        .await
        .ok_or(AppError::SessionNotFound)??;

    if !removed {
        tracing::info!(%session_id, %owner, "owner was not listed");
    }

    let session = session_payload(&sessions, session_id).await?;

    Ok(Json(SessionResponsePayload::builder().session(session).build()))
}

#[tracing::instrument(skip_all)]
pub async fn update_session_form<C>(
    State(app): State<App<C>>,
    Json(payload): Json<UpdateSessionFormRequestPayload>,
) -> Result<Json<SessionResponsePayload>, AppError>
where
    C: Connection,
{
    let App { sessions, .. } = app;

    let UpdateSessionFormRequestPayloadDissolved {
        session_id,
        name,
        minimum_threshold,
        initial_approvals,
        initial_votes,
    } = payload.dissolve();

    let update = WalletFormUpdate::builder()
        .maybe_name(name)
        .maybe_minimum_threshold(minimum_threshold)
        .maybe_initial_approvals(initial_approvals)
        .maybe_initial_votes(initial_votes)
        .build();

    sessions
        .update(session_id, |session| {
            edit_form(session, |form| {
                form.update(update);
                Ok(())
            })
        })
        .await
        .ok_or(AppError::SessionNotFound)??;

    let session = session_payload(&sessions, session_id).await?;

    Ok(Json(SessionResponsePayload::builder().session(session).build()))
}

#[tracing::instrument(skip_all)]
pub async fn get_wallet_details<C>(
    State(app): State<App<C>>,
    Json(payload): Json<GetWalletDetailsRequestPayload>,
) -> Result<Json<GetWalletDetailsResponsePayload>, AppError>
where
    C: Connection,
{
    let App { engine, .. } = app;

    let GetWalletDetailsRequestPayloadDissolved { wallet_address } = payload.dissolve();

    let wallet_address = parse_address(wallet_address.trim())?;

    let snapshot = engine
        .wallet_snapshot(wallet_address)
        .await
        .map_err(not_found_or(AppError::WalletNotFound))?;

    let response = GetWalletDetailsResponsePayload::builder().wallet((&snapshot).into()).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn list_wallet_tx<C>(
    State(app): State<App<C>>,
    Json(payload): Json<ListWalletTxRequestPayload>,
) -> Result<Json<ListWalletTxResponsePayload>, AppError>
where
    C: Connection,
{
    let App { engine, .. } = app;

    let ListWalletTxRequestPayloadDissolved { wallet_address, tab, search } = payload.dissolve();

    let wallet_address = parse_address(wallet_address.trim())?;

    let tab = match tab {
        Some(tab) => TxTab::from_str(tab.trim()).map_err(|_| AppError::InvalidTxTab(tab))?,
        None => TxTab::default(),
    };

    let snapshot = engine
        .wallet_snapshot(wallet_address)
        .await
        .map_err(not_found_or(AppError::WalletNotFound))?;

    let txs = snapshot
        .filter_transactions(tab, search.as_deref().unwrap_or_default())
        .map(TxRecordPayload::from)
        .collect_vec();

    Ok(Json(ListWalletTxResponsePayload::builder().txs(txs).build()))
}

#[tracing::instrument(skip_all)]
pub async fn submit_wallet_tx<C>(
    State(app): State<App<C>>,
    Json(payload): Json<SubmitWalletTxRequestPayload>,
) -> Result<Json<DispatchResponsePayload>, AppError>
where
    C: Connection,
{
    let App { engine, .. } = app;

    let SubmitWalletTxRequestPayloadDissolved { wallet_address, kind, to, token_address, value, data } =
        payload.dissolve();

    let request = {
        let wallet_address = parse_address(wallet_address.trim())?;

        let kind = TxKind::from_str(kind.trim()).map_err(|_| AppError::InvalidTxKind(kind))?;

        let tx_request = TransactionForm::builder()
            .kind(kind)
            .to(to)
            .maybe_token_address(token_address)
            .value(value)
            .maybe_data(data)
            .build()
            .validate()
            .map_err(AppError::InvalidTransactionRequest)?;

        CallRequest::builder().target(wallet_address).call(tx_request).build()
    };

    let dispatch = engine
        .dispatch(request)
        .await
        .inspect_err(|e| tracing::error!("failed to dispatch transaction: {e}"))?;

    Ok(Json(DispatchResponsePayload::builder().dispatch((&dispatch).into()).build()))
}

#[tracing::instrument(skip_all)]
pub async fn set_counter_number<C>(
    State(app): State<App<C>>,
    Json(payload): Json<SetCounterNumberRequestPayload>,
) -> Result<Json<DispatchResponsePayload>, AppError>
where
    C: Connection,
{
    let App { engine, counter_address, .. } = app;

    let SetCounterNumberRequestPayloadDissolved { number } = payload.dissolve();

    let number =
        U256::from_str_radix(number.trim(), 10).map_err(|_| AppError::InvalidNumber(number))?;

    let request = CallRequest::builder()
        .target(counter_address)
        .call(ContractCall::SetNumber { number })
        .build();

    let dispatch = engine.dispatch(request).await?;

    Ok(Json(DispatchResponsePayload::builder().dispatch((&dispatch).into()).build()))
}

#[tracing::instrument(skip_all)]
pub async fn get_counter_number<C>(
    State(app): State<App<C>>,
) -> Result<Json<GetCounterNumberResponsePayload>, AppError>
where
    C: Connection,
{
    let App { engine, counter_address, .. } = app;

    let number = engine.call_view(counter_address, ViewCall::GetNumber).await?;

    Ok(Json(GetCounterNumberResponsePayload::builder().number(number).build()))
}

#[tracing::instrument(skip_all)]
pub async fn get_dispatch_status<C>(
    State(app): State<App<C>>,
    Json(payload): Json<GetDispatchStatusRequestPayload>,
) -> Result<Json<DispatchResponsePayload>, AppError>
where
    C: Connection,
{
    let App { engine, .. } = app;

    let GetDispatchStatusRequestPayloadDissolved { dispatch_id } = payload.dissolve();

    let dispatch = engine
        .dispatch_handle(dispatch_id.into())
        .await
        .map_err(not_found_or(AppError::DispatchNotFound))?;

    Ok(Json(DispatchResponsePayload::builder().dispatch(DispatchPayload::from(&dispatch)).build()))
}

async fn session_payload(sessions: &SessionStore, id: Uuid) -> Result<SessionPayload, AppError> {
    sessions
        .read(id, |session| SessionPayload::new(id, session))
        .await
        .ok_or(AppError::SessionNotFound)
}

fn edit_form<T>(
    session: &mut Session,
    f: impl FnOnce(&mut WalletForm) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let screen = session.onboarding().screen().kind();

    session.onboarding_mut().form_mut().ok_or(AppError::FormLocked(screen)).and_then(f)
}

fn not_found_or(not_found: AppError) -> impl FnOnce(DispatchEngineError) -> AppError {
    move |err| if err.is_not_found() { not_found } else { err.into() }
}

