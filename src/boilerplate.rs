//! # Boilerplate Registry
//!
//! The TypeScript sources the tool scaffolds, as literal string templates
//! with `{{token}}` substitution. Everything that writes a handler, test,
//! layer or helper file renders it from here, so a later attach/detach edit
//! (like import injection) can rely on the exact shape that was generated.

use serde_json::json;

/// Replaces every `{{key}}` token with its substitution.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut output = template.to_string();
    for (key, value) in substitutions {
        output = output.replace(&format!("{{{{{key}}}}}"), value);
    }
    output
}

pub const LAMBDA_HANDLER: &str = r#"import { APIGatewayProxyEvent, APIGatewayProxyResult } from 'aws-lambda';

export const handler = async (
  event: APIGatewayProxyEvent
): Promise<APIGatewayProxyResult> => {
  console.log('{{name}} invoked', { path: event.path });
  return {
    statusCode: 200,
    body: JSON.stringify({ message: 'Hello from {{name}}' }),
  };
};
"#;

pub const LAMBDA_HANDLER_TEST: &str = r#"import { APIGatewayProxyEvent } from 'aws-lambda';
import { handler } from './handler';

describe('{{name}} handler', () => {
  it('returns a 200 response', async () => {
    const event = { path: '/{{name}}' } as APIGatewayProxyEvent;
    const result = await handler(event);
    expect(result.statusCode).toBe(200);
    expect(JSON.parse(result.body).message).toContain('{{name}}');
  });
});
"#;

pub const LAYER_INDEX: &str = r#"export interface ApiResponse {
  statusCode: number;
  body: string;
}

export const buildResponse = (statusCode: number, payload: unknown): ApiResponse => ({
  statusCode,
  body: JSON.stringify(payload),
});
"#;

pub const LAYER_INDEX_TEST: &str = r#"import { buildResponse } from './index';

describe('{{name}} layer', () => {
  it('serializes the payload', () => {
    const response = buildResponse(201, { ok: true });
    expect(response.statusCode).toBe(201);
    expect(JSON.parse(response.body)).toEqual({ ok: true });
  });
});
"#;

pub const AUTHORIZER_HANDLER: &str = r#"import {
  APIGatewayRequestAuthorizerEvent,
  APIGatewayAuthorizerResult,
} from 'aws-lambda';

const buildPolicy = (
  effect: 'Allow' | 'Deny',
  resource: string
): APIGatewayAuthorizerResult => ({
  principalId: 'user',
  policyDocument: {
    Version: '2012-10-17',
    Statement: [
      {
        Action: 'execute-api:Invoke',
        Effect: effect,
        Resource: resource,
      },
    ],
  },
});

export const handler = async (
  event: APIGatewayRequestAuthorizerEvent
): Promise<APIGatewayAuthorizerResult> => {
  const token = event.headers?.Authorization ?? '';
  const expected = process.env.BASIC_AUTH_TOKEN ?? '';
  const allowed = expected !== '' && token === `Basic ${expected}`;
  return buildPolicy(allowed ? 'Allow' : 'Deny', event.methodArn);
};
"#;

pub const AUTHORIZER_HANDLER_TEST: &str = r#"import { APIGatewayRequestAuthorizerEvent } from 'aws-lambda';
import { handler } from './handler';

const event = (authorization?: string) =>
  ({
    headers: authorization ? { Authorization: authorization } : {},
    methodArn: 'arn:aws:execute-api:*:*:api/*',
  }) as unknown as APIGatewayRequestAuthorizerEvent;

describe('basic authorizer', () => {
  beforeEach(() => {
    process.env.BASIC_AUTH_TOKEN = 'secret';
  });

  it('allows a matching token', async () => {
    const result = await handler(event('Basic secret'));
    expect(result.policyDocument.Statement[0].Effect).toBe('Allow');
  });

  it('denies a missing token', async () => {
    const result = await handler(event());
    expect(result.policyDocument.Statement[0].Effect).toBe('Deny');
  });
});
"#;

pub const TABLE_HANDLER: &str = r#"import { DynamoDBClient } from '@aws-sdk/client-dynamodb';
import {
  DynamoDBDocumentClient,
  PutCommand,
  GetCommand,
  DeleteCommand,
} from '@aws-sdk/lib-dynamodb';

const client = DynamoDBDocumentClient.from(new DynamoDBClient({}));
const TABLE_NAME = process.env.{{ENV}}_TABLE_NAME ?? '{{name}}';

export interface {{Name}}Key {
{{key_fields}}
}

export const put{{Name}} = async (item: {{Name}}Key & Record<string, unknown>) => {
  await client.send(new PutCommand({ TableName: TABLE_NAME, Item: item }));
  return item;
};

export const getOne{{Name}} = async (key: {{Name}}Key) => {
  const result = await client.send(new GetCommand({ TableName: TABLE_NAME, Key: key }));
  return result.Item;
};

export const remove{{Name}} = async (key: {{Name}}Key) => {
  await client.send(new DeleteCommand({ TableName: TABLE_NAME, Key: key }));
};
"#;

pub const TABLE_HANDLER_TEST: &str = r#"import { put{{Name}}, getOne{{Name}}, remove{{Name}} } from './{{name}}Handler';

const send = jest.fn();

jest.mock('@aws-sdk/lib-dynamodb', () => ({
  DynamoDBDocumentClient: { from: () => ({ send: (...args: unknown[]) => send(...args) }) },
  PutCommand: jest.fn((input) => input),
  GetCommand: jest.fn((input) => input),
  DeleteCommand: jest.fn((input) => input),
}));

describe('{{name}} table helpers', () => {
  beforeEach(() => {
    send.mockReset();
    send.mockResolvedValue({ Item: undefined });
  });

  it('puts an item', async () => {
    const item = { {{key_example}} };
    await expect(put{{Name}}(item)).resolves.toEqual(item);
    expect(send).toHaveBeenCalledTimes(1);
  });

  it('reads one item', async () => {
    await getOne{{Name}}({ {{key_example}} });
    expect(send).toHaveBeenCalledTimes(1);
  });

  it('removes an item', async () => {
    await remove{{Name}}({ {{key_example}} });
    expect(send).toHaveBeenCalledTimes(1);
  });
});
"#;

/// Import line spliced into a Lambda handler when a table policy is
/// attached; removal is keyed on the import path.
pub fn table_import_line(table: &str) -> String {
    let pascal = crate::template::pascal_case(table);
    format!(
        "import {{ put{pascal}, getOne{pascal}, remove{pascal} }} from '{}';",
        table_import_path(table)
    )
}

pub fn table_import_path(table: &str) -> String {
    format!("../utils/{table}Handler")
}

pub const GITIGNORE: &str = "node_modules/\n.aws-sam/\ncoverage/\n.env\n";

pub const TSCONFIG: &str = r#"{
  "compilerOptions": {
    "target": "es2020",
    "module": "commonjs",
    "strict": true,
    "esModuleInterop": true,
    "skipLibCheck": true,
    "resolveJsonModule": true,
    "types": ["jest", "node"]
  },
  "include": ["src/**/*.ts"]
}
"#;

pub const JEST_CONFIG: &str = r#"module.exports = {
  preset: 'ts-jest',
  testEnvironment: 'node',
  roots: ['<rootDir>/src'],
};
"#;

/// `package.json` for a scaffolded project.
pub fn package_json(project: &str) -> String {
    let value = json!({
        "name": project,
        "version": "0.1.0",
        "private": true,
        "scripts": {
            "build": "sam build",
            "deploy": "sam deploy",
            "test": "jest",
        },
        "dependencies": {
            "@aws-sdk/client-dynamodb": "^3.400.0",
            "@aws-sdk/lib-dynamodb": "^3.400.0",
        },
        "devDependencies": {
            "@types/aws-lambda": "^8.10.92",
            "@types/jest": "^29.5.0",
            "@types/node": "^20.4.0",
            "esbuild": "^0.19.0",
            "jest": "^29.5.0",
            "ts-jest": "^29.1.0",
            "typescript": "^5.2.0",
        },
    });
    let mut text = serde_json::to_string_pretty(&value).expect("static json serializes");
    text.push('\n');
    text
}
