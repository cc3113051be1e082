//! Drives a shared authority through the full register / request / verify
//! sequence for several subjects at once.

use std::sync::Arc;

use futures_util::future::join_all;
use peergate_authority::{
    AuthorityError, Ed25519Wallet, MemoryAuthority, SigningAuthority,
};
use peergate_condition::{Chain, ConditionTemplate, ResourceNamer, Subject, bind};

fn template() -> ConditionTemplate {
    ConditionTemplate::from_picker_value(serde_json::json!({
        "accessControlConditions": [{
            "contractAddress": "",
            "standardContractType": "",
            "chain": "rinkeby",
            "method": "eth_getBalance",
            "parameters": [":userAddress", "latest"],
            "returnValueTest": { "comparator": ">", "value": "0" }
        }]
    }))
    .unwrap()
}

async fn judge(
    authority: Arc<dyn SigningAuthority>,
    template: Arc<ConditionTemplate>,
    namer: ResourceNamer,
    address: &str,
) -> Result<bool, AuthorityError> {
    let chain = Chain::from("rinkeby");
    let auth = authority.sign_auth_message(&chain).await?;
    let bound = bind(&template, &Subject::new(address).unwrap()).unwrap();
    let resource = namer.next();

    authority
        .register_condition(&bound.condition, &chain, &auth, &resource)
        .await?;
    let token = authority
        .request_token(&bound.condition, &chain, &auth, &resource)
        .await?;
    let verification = authority.verify_token(&token).await?;

    Ok(verification.verified
        && verification
            .claims
            .is_some_and(|claims| claims.matches_resource(&resource)))
}

#[test_log::test(tokio::test)]
async fn it_serves_concurrent_subjects_independently() {
    let memory = MemoryAuthority::new(Ed25519Wallet::generate("0xME"));
    memory.set_balance("", "0xA", 1).await;
    memory.set_balance("", "0xC", 7).await;

    let authority: Arc<dyn SigningAuthority> = Arc::new(memory.clone());
    let template = Arc::new(template());
    let namer = ResourceNamer::new("http://localhost:3000");

    authority.connect().await.unwrap();

    let results = join_all(["0xA", "0xB", "0xC"].map(|address| {
        judge(authority.clone(), template.clone(), namer.clone(), address)
    }))
    .await;

    assert_eq!(results[0], Ok(true));
    assert!(matches!(results[1], Err(AuthorityError::Rejected(_))));
    assert_eq!(results[2], Ok(true));

    let calls = memory.calls().await;
    assert_eq!(calls.register, 3);
    assert_eq!(calls.request, 3);
    assert_eq!(calls.verify, 2);
}
